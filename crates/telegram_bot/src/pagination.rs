//! Paged inline keyboards.
//!
//! Lists are cut into pages of [`PAGE_SIZE`] entries. Every paged screen has
//! the same skeleton: an optional "add" row, one row per entry, a navigation
//! row (only when there is more than one page) and an optional "back" row.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::callback::Action;

pub(crate) const PAGE_SIZE: usize = 4;

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Page<'a, T> {
    pub items: &'a [T],
    /// 1-based.
    pub number: u32,
    pub count: u32,
}

pub(crate) fn page_count(total: usize) -> u32 {
    u32::try_from(total.div_ceil(PAGE_SIZE)).unwrap_or(u32::MAX)
}

/// Out of range requests land on the nearest existing page.
pub(crate) fn paginate<T>(items: &[T], page: u32) -> Page<'_, T> {
    let count = page_count(items.len());
    let number = page.clamp(1, count.max(1));
    let start = (number as usize - 1) * PAGE_SIZE;
    let end = (start + PAGE_SIZE).min(items.len());
    Page {
        items: items.get(start..end).unwrap_or_default(),
        number,
        count,
    }
}

pub(crate) struct Layout {
    pub add: Option<InlineKeyboardButton>,
    pub back: Option<InlineKeyboardButton>,
}

pub(crate) fn keyboard<T>(
    page: &Page<'_, T>,
    entry: impl Fn(&T) -> InlineKeyboardButton,
    goto: impl Fn(u32) -> Action,
    layout: Layout,
) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    if let Some(add) = layout.add {
        rows.push(vec![add]);
    }
    rows.extend(page.items.iter().map(|item| vec![entry(item)]));

    let nav = navigation_row(page.number, page.count, goto);
    if nav.len() > 1 {
        rows.push(nav);
    }
    if let Some(back) = layout.back {
        rows.push(vec![back]);
    }

    InlineKeyboardMarkup::new(rows)
}

fn navigation_row(number: u32, count: u32, goto: impl Fn(u32) -> Action) -> Vec<InlineKeyboardButton> {
    let mut row = Vec::with_capacity(3);
    if number > 1 {
        row.push(InlineKeyboardButton::callback(
            format!("< {}", number - 1),
            goto(number - 1).pack(),
        ));
    }
    row.push(InlineKeyboardButton::callback(
        number.to_string(),
        Action::Noop.pack(),
    ));
    if number < count {
        row.push(InlineKeyboardButton::callback(
            format!("{} >", number + 1),
            goto(number + 1).pack(),
        ));
    }
    row
}

#[cfg(test)]
mod tests {
    use teloxide::types::InlineKeyboardButtonKind;

    use super::*;

    fn data(button: &InlineKeyboardButton) -> &str {
        match &button.kind {
            InlineKeyboardButtonKind::CallbackData(data) => data,
            other => panic!("unexpected button kind {other:?}"),
        }
    }

    fn render(items: &[u32], page: u32) -> Vec<Vec<String>> {
        let page = paginate(items, page);
        let kb = keyboard(
            &page,
            |n| InlineKeyboardButton::callback(n.to_string(), Action::Group { chat_id: i64::from(*n) }.pack()),
            |p| Action::Groups { page: p },
            Layout {
                add: None,
                back: None,
            },
        );
        kb.inline_keyboard
            .iter()
            .map(|row| row.iter().map(|b| data(b).to_string()).collect())
            .collect()
    }

    #[test]
    fn counts_pages() {
        assert_eq!(page_count(0), 0);
        assert_eq!(page_count(4), 1);
        assert_eq!(page_count(5), 2);
        assert_eq!(page_count(9), 3);
    }

    #[test]
    fn nine_items_make_three_pages() {
        let items: Vec<u32> = (1..=9).collect();

        let first = paginate(&items, 1);
        assert_eq!(first.items, &[1, 2, 3, 4]);
        assert_eq!(first.count, 3);
        assert_eq!(paginate(&items, 2).items, &[5, 6, 7, 8]);
        assert_eq!(paginate(&items, 3).items, &[9]);
    }

    #[test]
    fn first_page_only_moves_forward() {
        let items: Vec<u32> = (1..=9).collect();
        let rows = render(&items, 1);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[4], vec!["noop", "groups:2"]);
    }

    #[test]
    fn middle_page_moves_both_ways() {
        let items: Vec<u32> = (1..=9).collect();
        let rows = render(&items, 2);
        assert_eq!(rows[4], vec!["groups:1", "noop", "groups:3"]);
    }

    #[test]
    fn last_page_only_moves_back() {
        let items: Vec<u32> = (1..=9).collect();
        let rows = render(&items, 3);
        assert_eq!(rows, vec![vec!["group:9".to_string()], vec!["groups:2".into(), "noop".into()]]);
    }

    #[test]
    fn single_page_has_no_navigation() {
        let rows = render(&[1, 2], 1);
        assert_eq!(rows, vec![vec!["group:1".to_string()], vec!["group:2".to_string()]]);
    }

    #[test]
    fn out_of_range_pages_are_clamped() {
        let items: Vec<u32> = (1..=9).collect();
        assert_eq!(paginate(&items, 7).number, 3);
        assert_eq!(paginate(&items, 0).number, 1);
        assert!(paginate::<u32>(&[], 2).items.is_empty());
    }

    #[test]
    fn add_and_back_frame_the_entries() {
        let items = [1u32];
        let page = paginate(&items, 1);
        let kb = keyboard(
            &page,
            |n| InlineKeyboardButton::callback(n.to_string(), Action::Noop.pack()),
            |p| Action::Groups { page: p },
            Layout {
                add: Some(InlineKeyboardButton::callback("Add", "group_add_manager:-1")),
                back: Some(InlineKeyboardButton::callback("Back", "group:-1")),
            },
        );
        let rows = &kb.inline_keyboard;
        assert_eq!(rows.len(), 3);
        assert_eq!(data(&rows[0][0]), "group_add_manager:-1");
        assert_eq!(data(&rows[2][0]), "group:-1");
    }
}
