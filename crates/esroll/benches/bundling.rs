use std::{fmt::Write as _, fs, hint::black_box, path::Path};

use criterion::{Criterion, criterion_group, criterion_main};
use esroll::{GenerateOptions, build};
use tempfile::TempDir;

/// A chain of modules, each re-using helpers that collide across modules
fn write_module_graph(root: &Path, modules: usize) {
    let mut entry = String::new();
    for index in 0..modules {
        writeln!(entry, "import {{ run as run{index} }} from './module{index}';")
            .expect("write to string");
        let next = if index + 1 < modules {
            format!("import {{ run as next }} from './module{}';\n", index + 1)
        } else {
            "function next() { return 0; }\n".to_owned()
        };
        let source = format!(
            "{next}\nvar counter = {{ value: {index} }};\ncounter.value += 1;\n\nfunction \
             helper(value) {{\n\treturn value * 2 + next();\n}}\n\nexport function run() {{\n\treturn \
             helper(counter.value);\n}}\n\nexport function unused() {{\n\treturn 'unused';\n}}\n"
        );
        fs::write(root.join(format!("module{index}.js")), source).expect("write module");
    }
    entry.push_str("\nexport var total = [");
    for index in 0..modules {
        write!(entry, "run{index}(), ").expect("write to string");
    }
    entry.push_str("];\n");
    fs::write(root.join("main.js"), entry).expect("write entry");
}

fn benchmark_bundling(c: &mut Criterion) {
    let temp_dir = TempDir::new().expect("create temp dir");
    write_module_graph(temp_dir.path(), 50);
    let entry = temp_dir.path().join("main.js");

    let mut group = c.benchmark_group("bundling");
    group.bench_function("build_50_modules", |b| {
        b.iter(|| build(black_box(&entry)).expect("bundle builds"));
    });

    let bundle = build(&entry).expect("bundle builds");
    group.bench_function("generate_50_modules", |b| {
        b.iter(|| {
            bundle
                .generate(black_box(&GenerateOptions::default()))
                .expect("bundle generates")
        });
    });
    group.finish();
}

criterion_group!(benches, benchmark_bundling);
criterion_main!(benches);
