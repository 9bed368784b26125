use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use parlo::{Role, TranscriptFragment, TurnAssembler};

/// Build a fragment stream alternating speakers, `pieces` interim fragments
/// per turn before the final one.
fn fragment_stream(turns: usize, pieces: usize) -> Vec<TranscriptFragment> {
    let mut fragments = Vec::with_capacity(turns * pieces);
    for turn in 0..turns {
        let role = if turn % 2 == 0 { Role::User } else { Role::Agent };
        for piece in 0..pieces {
            let is_final = piece == pieces - 1;
            fragments.push(TranscriptFragment::new(
                role,
                format!("word{} ", piece),
                is_final,
            ));
        }
    }
    fragments
}

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("turn_assembly");

    for &turns in &[10usize, 100, 1000] {
        let fragments = fragment_stream(turns, 8);
        group.bench_with_input(
            BenchmarkId::new("append_fragment", turns),
            &fragments,
            |b, fragments| {
                b.iter(|| {
                    let mut assembler = TurnAssembler::new();
                    for fragment in fragments {
                        black_box(assembler.append_fragment(fragment.clone()));
                    }
                    assembler.len()
                })
            },
        );
    }

    group.finish();
}

fn bench_long_interim_turn(c: &mut Criterion) {
    // One turn assembled from many small fragments — the worst case for
    // repeated tail concatenation
    let fragments = fragment_stream(1, 2000);

    c.bench_function("single_turn_2000_fragments", |b| {
        b.iter(|| {
            let mut assembler = TurnAssembler::new();
            for fragment in &fragments {
                black_box(assembler.append_fragment(fragment.clone()));
            }
            assembler.turns()[0].text.len()
        })
    });
}

criterion_group!(benches, bench_append, bench_long_interim_turn);
criterion_main!(benches);
