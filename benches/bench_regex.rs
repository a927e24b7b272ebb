use divan::Bencher;
use nextract::RegexArtifact;

fn main() {
    divan::main();
}

const PATTERNS: &[(&str, &str)] = &[
    ("literal", "hello"),
    ("alternation", "cat|dog|bird"),
    ("star", "a*b"),
    ("email_like", "[a-zA-Z0-9._-]+@[a-zA-Z0-9-]+\\.[a-zA-Z]{2,4}"),
];

#[divan::bench(args = PATTERNS)]
fn compile(bencher: Bencher, case: &(&str, &str)) {
    let (_, pattern) = *case;
    bencher.bench_local(|| RegexArtifact::compile(pattern, "re", "label"));
}
