use divan::Bencher;
use nextract::Trie;

fn main() {
    divan::main();
}

const WORD_COUNTS: &[usize] = &[100, 1_000, 10_000];

/// A small xorshift generator, seeded deterministically so bench inputs are
/// reproducible across runs without pulling in an RNG crate.
struct Xorshift(u64);

impl Xorshift {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }
}

fn words(n: usize) -> Vec<String> {
    let mut rng = Xorshift(0x9e3779b97f4a7c15);
    (0..n)
        .map(|_| {
            let len = 3 + (rng.next() % 13) as usize;
            (0..len).map(|_| (b'a' + (rng.next() % 26) as u8) as char).collect()
        })
        .collect()
}

#[divan::bench(args = WORD_COUNTS)]
fn insert(bencher: Bencher, n: usize) {
    let data = words(n);
    bencher.bench_local(|| {
        let mut trie = Trie::new();
        for w in &data {
            trie.insert(w);
        }
        trie
    });
}

#[divan::bench(args = WORD_COUNTS)]
fn search_hit(bencher: Bencher, n: usize) {
    let data = words(n);
    let mut trie = Trie::new();
    for w in &data {
        trie.insert(w);
    }
    bencher.bench_local(|| {
        for w in &data {
            divan::black_box(trie.search(w));
        }
    });
}
