use std::collections::HashSet;

use proptest::prelude::*;

use paperbridge::bridge::ReplyChannelAllocator;
use paperbridge::search::{ResultItem, ResultSet, normalize, normalize_date};
use paperbridge::test_utils::fixtures::{plos_doc, plos_response};
use paperbridge::upstream::{TermKind, classify_term};

fn arb_item() -> impl Strategy<Value = ResultItem> {
    (
        r"10\.[0-9]{4}/[a-z.]{1,12}",
        ".{0,40}",
        prop::collection::vec(".{0,40}", 0..3),
        "[A-Z ]{0,12}",
        prop::collection::vec("[A-Za-z. ]{1,16}", 0..4),
        "[0-9]{4}-[0-9]{2}-[0-9]{2}",
    )
        .prop_map(
            |(id, title, abstract_paragraphs, venue, authors, published_at)| ResultItem {
                id,
                title,
                abstract_paragraphs,
                venue,
                authors,
                published_at,
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn reply_topics_never_collide(prefix in "[A-Za-z_][A-Za-z0-9_]{0,10}") {
        let allocator = ReplyChannelAllocator::new(prefix.clone());
        let mut seen = HashSet::with_capacity(10_000);
        for _ in 0..10_000 {
            let topic = allocator.next_topic();
            let expected_prefix = format!("{prefix}.");
            prop_assert!(topic.starts_with(&expected_prefix));
            prop_assert!(seen.insert(topic));
        }
    }
}

proptest! {
    #[test]
    fn success_sets_track_next_offset(
        term in ".{0,20}",
        offset in 0usize..10_000,
        total in 0u64..100_000,
        items in prop::collection::vec(arb_item(), 0..8),
    ) {
        let count = items.len();
        let set = ResultSet::success(term, total, offset, items).unwrap();
        prop_assert!(!set.is_error());
        prop_assert!(set.error_message().is_empty());
        prop_assert_eq!(set.next_offset(), offset + count);

        let decoded = ResultSet::from_slice(&set.to_vec().unwrap()).unwrap();
        prop_assert_eq!(decoded, set);
    }

    #[test]
    fn soft_errors_always_carry_a_message(term in ".{0,20}", message in ".{0,40}") {
        let set = ResultSet::soft_error(term, message);
        prop_assert!(set.is_error());
        prop_assert!(set.items().is_empty());
        prop_assert!(!set.error_message().trim().is_empty());
        prop_assert!(!set.has_more());
    }

    #[test]
    fn normalized_pages_keep_every_document(count in 0usize..20, offset in 0usize..500) {
        let docs: Vec<_> = (0..count)
            .map(|i| plos_doc(&format!("10.1371/journal.pone.{i:07}"), &format!("T{i}")))
            .collect();
        let raw = plos_response(10_000, offset, &docs);
        let set = normalize(&raw, "q", offset).unwrap();
        prop_assert_eq!(set.items().len(), count);
        prop_assert_eq!(set.next_offset(), offset + count);
    }

    #[test]
    fn valid_timestamps_become_calendar_dates(
        year in 1900i32..2100,
        month in 1u32..=12,
        day in 1u32..=28,
        hour in 0u32..24,
    ) {
        let raw = format!("{year:04}-{month:02}-{day:02}T{hour:02}:00:00Z");
        prop_assert_eq!(normalize_date(&raw), format!("{year:04}-{month:02}-{day:02}"));
    }

    #[test]
    fn unparsable_dates_pass_through(raw in "[a-z ]{0,16}") {
        prop_assert_eq!(normalize_date(&raw), raw);
    }

    #[test]
    fn dois_are_identifier_lookups(registrant in "[0-9]{4,9}", suffix in "[-._;()/:a-zA-Z0-9]{1,30}") {
        let doi = format!("10.{registrant}/{suffix}");
        prop_assert_eq!(classify_term(&doi), TermKind::Identifier);
    }

    #[test]
    fn text_with_inner_spaces_is_a_title_lookup(a in "[a-z]{1,10}", b in "[a-z]{1,10}") {
        prop_assert_eq!(classify_term(&format!("{a} {b}")), TermKind::Title);
    }
}
