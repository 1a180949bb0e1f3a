use criterion::{Criterion, black_box, criterion_group, criterion_main};
use clinlp_core::anonymize::NoteAnonymizer;
use clinlp_core::corpus::ChunkWriter;
use clinlp_core::pipeline::{RuleRecognizer, RuleSegmenter};

fn bench_anonymize(c: &mut Criterion) {
    let anonymizer = NoteAnonymizer::new(RuleRecognizer::new().unwrap());
    let chunker = ChunkWriter::new(RuleSegmenter::new());

    let notes = vec![
        "Dr. Smith visited Amsterdam on 2020-01-01.",
        "Pt. gezien door dhr. van der Berg op 3 maart 2021 i.v.m. pijn op de borst.",
        "Overgeplaatst vanuit Rotterdam naar Utrecht. Controle op vrijdag 12-03-2021 bij mw. Jansen.",
        "Geen bijzonderheden. Patiënt slaapt goed en eet normaal.",
    ];

    c.bench_function("anonymize_single", |b| {
        b.iter(|| anonymizer.anonymize(black_box(notes[0])).unwrap());
    });

    c.bench_function("anonymize_and_chunk_batch_4", |b| {
        b.iter(|| {
            for note in &notes {
                let anonymized = anonymizer.anonymize(black_box(note)).unwrap();
                let _ = chunker.segment_and_chunk(&anonymized).unwrap();
            }
        });
    });
}

criterion_group!(benches, bench_anonymize);
criterion_main!(benches);
