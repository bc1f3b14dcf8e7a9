use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cohortgrade_core::grading::normalize;
use cohortgrade_core::statistics::{aggregate, GradeEntry};

fn make_sheet(students: usize, exams: usize) -> Vec<GradeEntry> {
    let mut entries = Vec::with_capacity(students * exams);
    for e in 0..exams {
        for s in 0..students {
            let exam_id = format!("exam-{e}");
            let student_id = format!("student-{s}");
            if (s + e) % 7 == 0 {
                entries.push(GradeEntry::ungraded(&exam_id, &student_id));
            } else {
                let score = ((s * 31 + e * 17) % 101) as f64;
                entries.push(GradeEntry::graded(&exam_id, &student_id, score));
            }
        }
    }
    entries
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    group.bench_function("in_range", |b| {
        b.iter(|| {
            normalize(
                black_box(15.0),
                black_box(0.0),
                black_box(20.0),
                black_box(0.0),
                black_box(100.0),
            )
        })
    });

    group.bench_function("clamped", |b| {
        b.iter(|| {
            normalize(
                black_box(27.5),
                black_box(0.0),
                black_box(20.0),
                black_box(60.0),
                black_box(100.0),
            )
        })
    });

    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");

    for (students, exams) in [(30, 5), (300, 10), (3000, 12)] {
        let sheet = make_sheet(students, exams);
        group.bench_function(format!("students={students},exams={exams}"), |b| {
            b.iter(|| aggregate(black_box(exams), black_box(&sheet), black_box(70.0)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_normalize, bench_aggregate);
criterion_main!(benches);
