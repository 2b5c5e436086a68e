//! Lexer benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use yy_parser::{Lexer, LexerOptions, PatternSet};

const SAMPLE_SOURCE: &str = r"
int fibonacci(int n) {
    if (n <= 1) return n;
    return fibonacci(n - 1) + fibonacci(n - 2);
}

/* accumulate into a running total */
static long total = 0;

void add(long value) {
    total = total + value * 2;
}

int main(void) {
    char buffer[64];
    for (int i = 0; i < 10; i = i + 1) {
        add(fibonacci(i));
    }
    return 0;
}
";

const EXPRESSIONS: &[&str] = &[
    "[0-9]+",
    "[a-zA-Z_][a-zA-Z0-9_]*",
    "<=|>=|==|!=",
];
const IGNORE: &[&str] = &["[ \t\r\n]+", "/\\*.*?\\*/"];
const LITERALS: &[u8] = b"{}()[];,=+-*<>";

fn bench_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer");
    group.throughput(Throughput::Bytes(SAMPLE_SOURCE.len() as u64));

    let patterns = PatternSet::new(EXPRESSIONS)
        .with_ignore(IGNORE)
        .with_literals(LITERALS);

    group.bench_function("sample", |b| {
        b.iter(|| {
            let mut lexer = Lexer::new(
                black_box(SAMPLE_SOURCE.as_bytes()),
                patterns,
                LexerOptions::default(),
            );
            while let Some(token) = lexer.get_token().unwrap() {
                black_box(token);
            }
        });
    });

    group.bench_function("skip_unknown", |b| {
        let noisy = SAMPLE_SOURCE.replace(';', "@;");
        b.iter(|| {
            let mut lexer = Lexer::new(
                black_box(noisy.as_bytes()),
                patterns,
                LexerOptions::default().with_skip_unknown(true),
            );
            while let Some(token) = lexer.get_token().unwrap() {
                black_box(token);
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_lexer);
criterion_main!(benches);
