use criterion::{criterion_group, criterion_main, Criterion};
use result_kernel_core::{
    resolve_registration, Branch, LookupPolicy, RawRecord, RecordSource, StoreError,
};
use serde_json::{json, Map, Value};

struct BenchSource {
    records: Vec<RawRecord>,
}

impl RecordSource for BenchSource {
    fn load(&self, branch: Branch) -> Result<Vec<RawRecord>, StoreError> {
        if branch == Branch::Cs {
            Ok(self.records.clone())
        } else {
            Ok(Vec::new())
        }
    }
}

fn mk_row(index: usize) -> RawRecord {
    let mut fields = Map::new();
    fields.insert("Reg. No".to_string(), json!(format!("PIET21CS{index:04}")));
    fields.insert("Name".to_string(), json!(format!("Student {index}")));
    fields.insert("Uni-Roll No".to_string(), json!(format!("22EPACS{index:04}")));
    fields.insert("Col Roll No".to_string(), json!(format!("CS-{index}")));
    fields.insert("4CS4-05".to_string(), json!("A"));
    fields.insert("4CS4-06".to_string(), json!("B+"));
    fields.insert("4CS4-05.1".to_string(), json!("A"));
    fields.insert("Total Back".to_string(), Value::from(0));
    fields.insert("Result".to_string(), json!("PASS"));
    fields.insert("SGPA".to_string(), json!(8.1));
    RawRecord(fields)
}

fn bench_resolve(c: &mut Criterion) {
    let source = BenchSource { records: (0..1_000).map(mk_row).collect() };

    c.bench_function("resolve_registration_1000_records", |b| {
        b.iter(|| {
            let matches =
                resolve_registration(&source, "PIET21CS0750", None, LookupPolicy::default());
            if let Err(err) = matches {
                panic!("benchmark lookup failed: {err}");
            }
        });
    });
}

fn bench_normalize(c: &mut Criterion) {
    let records = (0..1_000).map(mk_row).collect::<Vec<_>>();

    c.bench_function("normalize_record_1000_rows", |b| {
        b.iter(|| {
            for record in &records {
                let cleaned = result_kernel_core::normalize_record(
                    record,
                    Branch::Cs,
                    LookupPolicy::default(),
                );
                if cleaned.branch != Branch::Cs {
                    panic!("benchmark normalization produced wrong branch");
                }
            }
        });
    });
}

criterion_group!(resolver_benches, bench_resolve, bench_normalize);
criterion_main!(resolver_benches);
