//! Page math for the floating-device rotation

/// Number of pages needed to rotate through the floating devices
///
/// Pinned devices repeat on every page, so each page offers
/// `capacity - fixed_count` floating slots (at least one, so a fully
/// pinned grid still yields one page).
pub fn page_count(total_devices: usize, fixed_count: usize, capacity: usize) -> usize {
    let floating = total_devices.saturating_sub(fixed_count);
    let per_page = capacity.saturating_sub(fixed_count).max(1);
    floating.div_ceil(per_page).max(1)
}

/// Clamp a page into `[1, page_count]`
pub fn clamp_page(page: usize, page_count: usize) -> usize {
    page.clamp(1, page_count.max(1))
}

/// Manual navigation backwards, stopping at the first page
pub fn prev_page(page: usize) -> usize {
    page.saturating_sub(1).max(1)
}

/// Manual navigation forwards, stopping at the last page
pub fn next_page(page: usize, page_count: usize) -> usize {
    (page + 1).min(page_count.max(1))
}

/// Autoplay advancement: wraps back to the first page
pub fn advance_wrapping(page: usize, page_count: usize) -> usize {
    if page >= page_count {
        1
    } else {
        page + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_floating_devices_on_a_four_grid_need_three_pages() {
        assert_eq!(page_count(10, 0, 4), 3);
    }

    #[test]
    fn pinned_devices_shrink_the_per_page_window() {
        // 5 devices, 2 pinned on a 4-grid: 3 floating over 2 slots per page
        assert_eq!(page_count(5, 2, 4), 2);
    }

    #[test]
    fn empty_selection_still_has_one_page() {
        assert_eq!(page_count(0, 0, 4), 1);
    }

    #[test]
    fn fully_pinned_grid_has_one_page() {
        assert_eq!(page_count(4, 4, 4), 1);
    }

    #[test]
    fn clamp_pulls_an_out_of_range_page_back() {
        assert_eq!(clamp_page(5, 3), 3);
        assert_eq!(clamp_page(0, 3), 1);
        assert_eq!(clamp_page(2, 3), 2);
    }

    #[test]
    fn manual_navigation_stops_at_bounds() {
        assert_eq!(prev_page(1), 1);
        assert_eq!(prev_page(3), 2);
        assert_eq!(next_page(3, 3), 3);
        assert_eq!(next_page(1, 3), 2);
    }

    #[test]
    fn autoplay_wraps_from_the_last_page() {
        assert_eq!(advance_wrapping(3, 3), 1);
        assert_eq!(advance_wrapping(1, 3), 2);
        // page_count shrank under the current page: wrap, don't overshoot
        assert_eq!(advance_wrapping(5, 3), 1);
    }
}
