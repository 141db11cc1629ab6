use super::*;

#[test]
fn test_page_request_default() {
    let request = PageRequest::default();
    assert_eq!(request.page, 1);
    assert_eq!(request.per_page, 20);
}

#[test]
fn test_page_request_new_clamps_zero() {
    let request = PageRequest::new(0, 0);
    assert_eq!(request.page, 1);
    assert_eq!(request.per_page, 1);
}

#[test]
fn test_page_request_offset() {
    assert_eq!(PageRequest::new(1, 20).offset(), 0);
    assert_eq!(PageRequest::new(3, 20).offset(), 40);
}

#[test]
fn test_page_request_offset_does_not_overflow_u32() {
    let request = PageRequest::new(u32::MAX, u32::MAX);
    assert_eq!(
        request.offset(),
        u64::from(u32::MAX - 1) * u64::from(u32::MAX)
    );
}

#[test]
fn test_count_only_request() {
    let request = PageRequest::count_only();
    assert_eq!(request.limit(), 1);
    assert_eq!(request.offset(), 0);
}

#[test]
fn test_page_response_new() {
    let data = vec![1, 2, 3];
    let response = PageResponse::new(data.clone(), PageRequest::new(1, 10), 3);

    assert_eq!(response.data, data);
    assert_eq!(response.meta.page, 1);
    assert_eq!(response.meta.per_page, 10);
    assert_eq!(response.meta.total, 3);
    assert_eq!(response.meta.total_pages, 1);
}

#[test]
fn test_page_response_pagination() {
    // 25 items, 10 per page -> 3 pages
    let response: PageResponse<i32> = PageResponse::new(vec![], PageRequest::new(1, 10), 25);
    assert_eq!(response.meta.total_pages, 3);
}

#[test]
fn test_page_response_empty() {
    let response: PageResponse<i32> = PageResponse::new(vec![], PageRequest::new(1, 10), 0);
    assert_eq!(response.meta.total_pages, 1);
}
