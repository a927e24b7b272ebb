mod stream_properties {
    use nextract::stream::StreamFlags;
    use nextract::Cursor;

    #[test]
    fn next_then_prev_restores_bof() {
        let mut c = Cursor::open_buffer("hello".as_bytes());
        c.next_char();
        c.prev_char();
        assert_eq!(c.pos(), 0);
        assert!(c.flags().contains(StreamFlags::BOF));
    }

    #[test]
    fn move_then_inverse_restores_position() {
        let mut c = Cursor::open_buffer("hello world".as_bytes());
        c.move_by(5);
        let pos = (c.pos(), c.codepoint_offset());
        c.move_by(-5);
        assert_eq!((c.pos(), c.codepoint_offset()), (0, 0));
        c.move_by(5);
        assert_eq!((c.pos(), c.codepoint_offset()), pos);
    }

    #[test]
    fn navigation_stays_within_bounds() {
        let mut c = Cursor::open_buffer(b"ab");
        for _ in 0..10 {
            c.next_char();
            assert!(c.pos() >= c.start() && c.pos() <= c.end());
        }
        for _ in 0..10 {
            c.prev_char();
            assert!(c.pos() >= c.start() && c.pos() <= c.end());
        }
    }
}

mod patricia_properties {
    use nextract::Trie;

    const FIXTURE: &[&str] = &[
        "aaaa", "aaab", "aaac", "aaad", "aaae", "aaafaa", "aaafab", "aaafac", "aaafad", "aaafae",
        "aaafaf", "aaafag", "aaafah", "aaag", "aab", "aba", "abb",
    ];

    #[test]
    fn insert_then_search_every_fixture_string() {
        let mut trie = Trie::new();
        for s in FIXTURE {
            trie.insert(s);
        }
        for s in FIXTURE {
            let (n, node) = trie.search_ext(s);
            assert_eq!(n, s.len());
            assert!(trie.is_terminal(node));
        }
    }

    #[test]
    fn prefix_law_holds_for_every_fixture_string() {
        let mut trie = Trie::new();
        for s in FIXTURE {
            trie.insert(s);
        }
        for s in FIXTURE {
            for i in 1..s.len() {
                let prefix = &s[..i];
                assert_eq!(trie.search(prefix), prefix.len());
            }
        }
    }

    #[test]
    fn multi_character_edge_search_matches_spec_fixture() {
        let mut trie = Trie::new();
        for s in FIXTURE {
            trie.insert(s);
        }
        let (n, node) = trie.search_ext("aaafah");
        assert_eq!(n, 6);
        assert!(trie.is_terminal(node));

        let (n, node) = trie.search_ext("aaafb");
        assert_eq!(n, 4);
        assert!(!trie.is_terminal(node));
    }

    #[test]
    fn save_load_round_trip_preserves_lookups_and_data() {
        let mut trie = Trie::new();
        for s in FIXTURE {
            trie.insert(s);
        }
        trie.set("aaafah", b"payload");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.patty");
        nextract::patricia::patty::save(&trie, &path).unwrap();
        let loaded = nextract::patricia::patty::open(&path).unwrap();

        assert!(loaded.is_read_only());
        for s in FIXTURE {
            let (n, node) = loaded.search_ext(s);
            assert_eq!(n, s.len());
            assert!(loaded.is_terminal(node));
        }
        assert_eq!(loaded.get("aaafah"), Some(&b"payload"[..]));
        assert_eq!(loaded.data_lookup().len(), trie.data_lookup().len());
    }
}

mod regex_properties {
    use nextract::RegexArtifact;

    #[test]
    fn grouped_and_ungrouped_literal_accept_the_same_language() {
        let grouped = RegexArtifact::compile("(ab)", "re", "l");
        let ungrouped = RegexArtifact::compile("ab", "re", "l");
        assert!(grouped.errors.is_empty());
        assert!(ungrouped.errors.is_empty());
        assert_eq!(grouped.dfa.node_count() > 0, ungrouped.dfa.node_count() > 0);
    }

    #[test]
    fn unbalanced_parens_is_rejected() {
        let artifact = RegexArtifact::compile("(abc", "re", "l");
        assert!(!artifact.errors.is_empty());
    }

    #[test]
    fn empty_bracket_is_rejected() {
        let artifact = RegexArtifact::compile("a[]b", "re", "l");
        assert!(!artifact.errors.is_empty());
    }

    #[test]
    fn negated_empty_bracket_is_rejected() {
        let artifact = RegexArtifact::compile("a[^]b", "re", "l");
        assert!(!artifact.errors.is_empty());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let artifact = RegexArtifact::compile("[z-a]", "re", "l");
        assert!(!artifact.errors.is_empty());
    }

    #[test]
    fn email_like_pattern_compiles_without_errors() {
        let pattern = "[^@ \t\r\n]+@[^@ \t\r\n]+\\.[^@ \t\r\n]+";
        let artifact = RegexArtifact::compile(pattern, "re", "email");
        assert!(artifact.errors.is_empty());
    }

    #[test]
    fn phone_like_pattern_compiles_without_errors() {
        let pattern = "[+]?[(]?[0-9]{3}[)]?[-\\s.]?[0-9]{3}[-\\s.]?[0-9]{4,6}";
        let artifact = RegexArtifact::compile(pattern, "re", "phone");
        assert!(artifact.errors.is_empty());
    }
}

mod end_to_end {
    use std::sync::Arc;

    use nextract::miner::{Dir, Matcher, MatcherFn, Miner, Occurrence};
    use nextract::miners::GlobMiner;
    use nextract::{Cursor, Extractor, ExtractorFlags, RegexArtifact};

    fn literal_miner(label: &str, literal: &'static str) -> Miner {
        let matcher: Arc<MatcherFn> = Arc::new(move |m: &mut Miner| -> Option<Occurrence> {
            if !m.mark_start() {
                return None;
            }
            if m.match_string(literal) && m.mark_end() {
                return m.make_occurrence(1.0);
            }
            None
        });
        Miner::new(label, Cursor::open_buffer(b""), matcher, false)
    }

    /// These literals carry no glob metacharacters, so the compiled pattern
    /// matches the same literal run `literal_miner` did, but through the
    /// real glob miner rather than a standalone `match_string` matcher.
    fn glob_miner(label: &str, glob: &'static str) -> Miner {
        let compiled = GlobMiner::compile(glob).unwrap();
        Miner::new(label, Cursor::open_buffer(b""), compiled.matcher_fn(), false)
    }

    fn drain(extractor: &mut Extractor, batch: usize) -> Vec<Occurrence> {
        let mut all = Vec::new();
        while !extractor.is_exhausted() {
            all.extend(extractor.next(batch).unwrap());
        }
        all
    }

    #[test]
    fn scenario_1_single_batch_glob_overlap() {
        let miners = vec![
            glob_miner("full", "abc def"),
            glob_miner("abc", "abc"),
            glob_miner("def", "def"),
        ];
        let mut extractor = Extractor::new(3, miners);
        extractor.set_stream(Cursor::open_buffer(b"abc def"));
        let all = drain(&mut extractor, 10);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn scenario_1_no_enclosed_keeps_only_the_longest() {
        let miners = vec![
            glob_miner("full", "abc def"),
            glob_miner("abc", "abc"),
            glob_miner("def", "def"),
        ];
        let mut extractor = Extractor::new(3, miners);
        extractor.set_flags(ExtractorFlags::NO_ENCLOSED_OCCURRENCES);
        extractor.set_stream(Cursor::open_buffer(b"abc def"));
        let all = drain(&mut extractor, 10);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].as_str(), "abc def");
    }

    #[test]
    fn scenario_2_multi_batch_overlap_counts() {
        let input: &'static [u8] = b"abc def ghi jkl";
        let build = || {
            vec![
                glob_miner("abcdef", "abc def"),
                glob_miner("abc", "abc"),
                glob_miner("def", "def"),
                glob_miner("defghi", "def ghi"),
                glob_miner("ghi", "ghi"),
                glob_miner("jkl", "jkl"),
            ]
        };

        let mut plain = Extractor::new(4, build());
        plain.set_stream(Cursor::open_buffer(input));
        assert_eq!(drain(&mut plain, 3).len(), 6);

        let mut filtered = Extractor::new(4, build());
        filtered.set_flags(ExtractorFlags::NO_ENCLOSED_OCCURRENCES);
        filtered.set_stream(Cursor::open_buffer(input));
        assert_eq!(drain(&mut filtered, 3).len(), 3);
    }

    #[test]
    fn scenario_3_batch_size_does_not_change_totals() {
        let input: &'static [u8] = b"abc def ghi jkl";
        let build = || {
            vec![
                glob_miner("abcdef", "abc def"),
                glob_miner("abc", "abc"),
                glob_miner("def", "def"),
                glob_miner("defghi", "def ghi"),
                glob_miner("ghi", "ghi"),
                glob_miner("jkl", "jkl"),
            ]
        };

        let mut batch_one = Extractor::new(4, build());
        batch_one.set_stream(Cursor::open_buffer(input));
        assert_eq!(drain(&mut batch_one, 1).len(), 6);

        let mut batch_one_filtered = Extractor::new(4, build());
        batch_one_filtered.set_flags(ExtractorFlags::NO_ENCLOSED_OCCURRENCES);
        batch_one_filtered.set_stream(Cursor::open_buffer(input));
        assert_eq!(drain(&mut batch_one_filtered, 1).len(), 3);
    }

    #[test]
    fn scenario_4_identical_span_different_labels_both_kept() {
        let glob = literal_miner("glob_abc", "abc");
        let regex_artifact = RegexArtifact::compile("abc", "re", "regex_abc");
        let regex_miner = Miner::new("regex_abc", Cursor::open_buffer(b""), regex_artifact.matcher_fn(), false);

        let mut extractor = Extractor::new(2, vec![glob, regex_miner]);
        extractor.set_flags(ExtractorFlags::NO_ENCLOSED_OCCURRENCES);
        extractor.set_stream(Cursor::open_buffer(b"abc"));
        let all = drain(&mut extractor, 10);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].pos, all[1].pos);
        assert_eq!(all[0].len, all[1].len);
        assert_ne!(all[0].label, all[1].label);
    }

    #[test]
    fn scenario_5_email_and_phone_regex_over_fixture_text() {
        let email = RegexArtifact::compile("[^@ \t\r\n]+@[^@ \t\r\n]+\\.[^@ \t\r\n]+", "re", "email");
        let phone = RegexArtifact::compile("[+]?[(]?[0-9]{3}[)]?[-\\s.]?[0-9]{3}[-\\s.]?[0-9]{4,6}", "re", "phone");
        assert!(email.errors.is_empty());
        assert!(phone.errors.is_empty());

        let email_miner = Miner::new("email", Cursor::open_buffer(b""), email.matcher_fn(), false);
        let phone_miner = Miner::new("phone", Cursor::open_buffer(b""), phone.matcher_fn(), false);

        let mut extractor = Extractor::new(2, vec![email_miner, phone_miner]);
        extractor.set_stream(Cursor::open_buffer(b"contact jane@example.com or call 555-123-4567"));
        let all = drain(&mut extractor, 64);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn last_max_is_monotonic_across_batches() {
        let build = || vec![literal_miner("abc", "abc")];
        let mut extractor = Extractor::new(2, build());
        extractor.set_flags(ExtractorFlags::NO_ENCLOSED_OCCURRENCES);
        extractor.set_stream(Cursor::open_buffer(b"abc abc abc abc"));
        let mut last = 0u64;
        while !extractor.is_exhausted() {
            let occs = extractor.next(2).unwrap();
            for occ in &occs {
                assert!(occ.byte_end() >= last);
                last = occ.byte_end();
            }
        }
    }
}
