use divan::Bencher;
use nextract::miner::Matcher;
use nextract::miners::EmailMiner;
use nextract::stream::Cursor;
use nextract::{Extractor, ExtractorFlags, Miner};

fn main() {
    divan::main();
}

const BATCH_SIZES: &[usize] = &[64, 512, 4096];

fn haystack(emails: usize) -> String {
    let mut s = String::new();
    for i in 0..emails {
        s.push_str(&format!("user{i}@example{i}.com filler text between entries "));
    }
    s
}

#[divan::bench(args = BATCH_SIZES)]
fn next_batch(bencher: Bencher, batch: usize) {
    let text = haystack(200);
    bencher.bench_local(|| {
        let miner = Miner::new("Email", Cursor::open_buffer(b""), EmailMiner.matcher_fn(), false);
        let mut extractor = Extractor::new(4, vec![miner]);
        extractor.set_flags(ExtractorFlags::SORT_RESULTS);
        extractor.set_stream(Cursor::open_buffer(text.as_bytes()));
        let mut total = 0;
        while !extractor.is_exhausted() {
            total += extractor.next(batch).unwrap().len();
        }
        divan::black_box(total)
    });
}
