//! A minimal end-to-end demo: wire up the email and glob miners on an
//! in-memory stream and print every occurrence found.

use nextract::miner::Matcher;
use nextract::miners::{EmailMiner, GlobMiner};
use nextract::stream::Cursor;
use nextract::{Extractor, ExtractorFlags, Miner};

fn main() {
    tracing_subscriber::fmt::init();

    let text = b"contact jane.doe@example.com about the *.log rotation for test.txt";

    let email_miner = Miner::new("Email", Cursor::open_buffer(b""), EmailMiner.matcher_fn(), false);
    let glob_matcher = GlobMiner::compile("*.log").expect("valid glob");
    let glob_miner = Miner::new("Glob", Cursor::open_buffer(b""), glob_matcher.matcher_fn(), false);

    let mut extractor = Extractor::new(2, vec![email_miner, glob_miner]);
    extractor.set_flags(ExtractorFlags::NO_ENCLOSED_OCCURRENCES | ExtractorFlags::SORT_RESULTS);

    if !extractor.set_stream(Cursor::open_buffer(text)) {
        eprintln!("failed to set stream: {:?}", extractor.last_error());
        return;
    }

    while !extractor.is_exhausted() {
        let occurrences = match extractor.next(64) {
            Ok(o) => o,
            Err(e) => {
                eprintln!("extraction failed: {e}");
                return;
            }
        };
        for occ in &occurrences {
            println!("{}: {:?} @ byte {}", occ.label, occ.as_str(), occ.pos);
        }
    }
}
