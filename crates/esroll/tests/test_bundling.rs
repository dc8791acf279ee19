use std::{fs, path::Path};

use anyhow::Result;
use esroll::{Bundle, BundleError, ExportMode, GenerateOptions, OutputFormat, build};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn create_test_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

fn project(files: &[(&str, &str)]) -> Result<TempDir> {
    let temp_dir = TempDir::new()?;
    for (name, content) in files {
        create_test_file(&temp_dir.path().join(name), content)?;
    }
    Ok(temp_dir)
}

fn bundle_code(root: &Path, entry: &str) -> Result<String> {
    let bundle = build(&root.join(entry))?;
    Ok(bundle.generate(&GenerateOptions::default())?.code)
}

#[test]
fn test_default_export_of_an_identifier() -> Result<()> {
    let dir = project(&[(
        "main.js",
        "function add(a, b) {\n\treturn a + b;\n}\n\nexport default add;\n",
    )])?;

    let code = bundle_code(dir.path(), "main.js")?;
    assert_eq!(
        code,
        "'use strict'\n\nfunction add(a, b) {\n\treturn a + b;\n}\n\nmodule.exports = add"
    );
    Ok(())
}

#[test]
fn test_external_named_import_is_rewritten() -> Result<()> {
    let dir = project(&[(
        "main.js",
        "import { resolve } from 'path';\n\nexport var here = resolve('a', 'b');\n",
    )])?;

    let code = bundle_code(dir.path(), "main.js")?;
    assert_eq!(
        code,
        "'use strict'\n\nvar path = require('path')\n\nvar here = path.resolve('a', \
         'b');\n\nexports.here = here"
    );
    Ok(())
}

#[test]
fn test_conflicting_helpers_are_renamed() -> Result<()> {
    let dir = project(&[
        (
            "main.js",
            "import { run as first } from './first';\nimport { run as second } from \
             './second';\n\nexport var results = [first(), second()];\n",
        ),
        (
            "first.js",
            "function helper() {\n\treturn 1;\n}\n\nexport function run() {\n\treturn \
             helper();\n}\n",
        ),
        (
            "second.js",
            "function helper() {\n\treturn 2;\n}\n\nexport function run() {\n\treturn \
             helper();\n}\n",
        ),
    ])?;

    let code = bundle_code(dir.path(), "main.js")?;
    assert_eq!(
        code,
        "'use strict'\n\nfunction _helper() {\n\treturn 1;\n}\n\nfunction _run() {\n\treturn \
         _helper();\n}\nfunction helper() {\n\treturn 2;\n}\n\nfunction run() {\n\treturn \
         helper();\n}\n\nvar results = [_run(), run()];\n\nexports.results = results"
    );
    Ok(())
}

#[test]
fn test_anonymous_defaults_with_the_same_suggestion_stay_distinct() -> Result<()> {
    let dir = project(&[
        (
            "main.js",
            "import x from './a';\nimport { y } from './b';\nexport var r = [x, y];\n",
        ),
        ("a.js", "export default 1;\n"),
        ("b.js", "import x from './c';\nexport var y = x;\n"),
        ("c.js", "export default 2;\n"),
    ])?;

    let code = bundle_code(dir.path(), "main.js")?;
    assert_eq!(
        code,
        "'use strict'\n\nvar _x = 1;\nvar x = 2;\nvar y = x;\nvar r = [_x, y];\n\nexports.r = r"
    );
    Ok(())
}

#[test]
fn test_default_named_after_the_entry_file() -> Result<()> {
    let dir = project(&[("main.js", "export function main() {}\nexport default 5;\n")])?;

    let code = bundle_code(dir.path(), "main.js")?;
    assert_eq!(
        code,
        "'use strict'\n\nfunction _main() {}\nvar main = 5;\n\nexports.main = _main\nexports.\
         default = main"
    );
    Ok(())
}

#[test]
fn test_namespace_import_gets_getters() -> Result<()> {
    let dir = project(&[
        (
            "main.js",
            "import * as ns from './m';\n\nexport var answer = ns.a + ns.default;\n",
        ),
        ("m.js", "export var a = 40;\nexport default 2;\n"),
    ])?;

    let code = bundle_code(dir.path(), "main.js")?;
    assert_eq!(
        code,
        "'use strict'\n\nvar ns = {\n\tget a () { return a },\n\tget default () { return \
         ns__default }\n}\n\nvar a = 40;\nvar ns__default = 2;\n\nvar answer = ns.a + \
         ns.default;\n\nexports.answer = answer"
    );
    Ok(())
}

#[test]
fn test_module_without_imports_or_exports_round_trips() -> Result<()> {
    let source = "var greeting = 'hello';\n\nfunction greet(name) {\n\treturn greeting + ' ' + \
                  name;\n}\n\nconsole.log(greet('world'));";
    let dir = project(&[("main.js", source)])?;

    let code = bundle_code(dir.path(), "main.js")?;
    assert_eq!(code, format!("'use strict'\n\n{source}"));
    Ok(())
}

#[test]
fn test_unused_code_is_shaken_out() -> Result<()> {
    let dir = project(&[
        (
            "main.js",
            "import { used } from './lib';\n\nexport default used();\n",
        ),
        (
            "lib.js",
            "var cache = {};\ncache.warm = true;\n\nexport function used() {\n\treturn \
             cache;\n}\n\nexport function unused() {\n\treturn 'nope';\n}\n",
        ),
    ])?;

    let code = bundle_code(dir.path(), "main.js")?;
    assert_eq!(
        code,
        "'use strict'\n\nvar cache = {};\ncache.warm = true;\n\nfunction used() {\n\treturn \
         cache;\n}\n\nvar main = used();\n\nmodule.exports = main"
    );
    Ok(())
}

#[test]
fn test_default_import_uses_the_local_name() -> Result<()> {
    let dir = project(&[
        (
            "main.js",
            "import square from './square';\n\nexport var nine = square(3);\n",
        ),
        ("square.js", "export default function (x) {\n\treturn x * x;\n}\n"),
    ])?;

    let code = bundle_code(dir.path(), "main.js")?;
    assert_eq!(
        code,
        "'use strict'\n\nvar square = function (x) {\n\treturn x * x;\n}\n\nvar nine = \
         square(3);\n\nexports.nine = nine"
    );
    Ok(())
}

#[test]
fn test_entry_reexports_are_exposed() -> Result<()> {
    let dir = project(&[
        ("main.js", "export { double as twice } from './math';\n"),
        ("math.js", "export function double(x) {\n\treturn x * 2;\n}\n"),
    ])?;

    let code = bundle_code(dir.path(), "main.js")?;
    assert_eq!(
        code,
        "'use strict'\n\nfunction double(x) {\n\treturn x * 2;\n}\n\nexports.twice = double"
    );
    Ok(())
}

#[test]
fn test_export_mode_inference_and_errors() -> Result<()> {
    let dir = project(&[
        ("none.js", "console.log('side effect');\n"),
        ("default.js", "export default 42;\n"),
        ("named.js", "export var a = 1;\nexport var b = 2;\n"),
    ])?;
    let root = dir.path();

    let none = build(&root.join("none.js"))?;
    assert_eq!(none.export_mode(ExportMode::Auto)?, ExportMode::None);

    let default = build(&root.join("default.js"))?;
    assert_eq!(default.export_mode(ExportMode::Auto)?, ExportMode::Default);

    let named = build(&root.join("named.js"))?;
    assert_eq!(named.export_mode(ExportMode::Auto)?, ExportMode::Named);

    let err = named
        .generate(&GenerateOptions {
            exports: ExportMode::Default,
            format: OutputFormat::Cjs,
        })
        .expect_err("two named exports cannot be a default export");
    match err.downcast_ref::<BundleError>() {
        Some(BundleError::InvalidExportMode { mode, keys }) => {
            assert_eq!(mode, "default");
            assert_eq!(keys, &["a", "b"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[test]
fn test_unresolved_export_aborts_the_build() -> Result<()> {
    let dir = project(&[
        ("main.js", "import { missing } from './lib';\nmissing();\n"),
        ("lib.js", "export var present = 1;\n"),
    ])?;

    let err = build(&dir.path().join("main.js")).expect_err("lib does not export missing");
    match err.downcast_ref::<BundleError>() {
        Some(BundleError::UnresolvedExport { name, .. }) => assert_eq!(name, "missing"),
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[test]
fn test_parse_and_read_errors_abort_the_build() -> Result<()> {
    let dir = project(&[
        ("broken.js", "var = 1;\n"),
        ("main.js", "import { a } from './absent';\na();\n"),
    ])?;

    let err = build(&dir.path().join("broken.js")).expect_err("syntax error");
    assert!(matches!(
        err.downcast_ref::<BundleError>(),
        Some(BundleError::Parse { line: 1, .. })
    ));

    let err = build(&dir.path().join("main.js")).expect_err("missing module");
    assert!(matches!(
        err.downcast_ref::<BundleError>(),
        Some(BundleError::UnreadableModule { .. })
    ));
    Ok(())
}

#[test]
fn test_entry_without_extension_and_write() -> Result<()> {
    let dir = project(&[("src/main.js", "export var a = 1;\n")])?;
    let bundle = Bundle::build(&dir.path().join("src/main"))?;
    assert_eq!(bundle.entry_path, dir.path().join("src/main.js"));

    let dest = dir.path().join("dist/bundle.js");
    bundle.write(&dest, &GenerateOptions::default())?;
    assert_eq!(
        fs::read_to_string(dest)?,
        "'use strict'\n\nvar a = 1;\n\nexports.a = a"
    );
    Ok(())
}

#[test]
fn test_generate_is_repeatable() -> Result<()> {
    let dir = project(&[
        ("main.js", "import { join } from 'path';\nexport default join('a', 'b');\n"),
    ])?;
    let bundle = build(&dir.path().join("main.js"))?;

    let first = bundle.generate(&GenerateOptions::default())?;
    let second = bundle.generate(&GenerateOptions::default())?;
    assert_eq!(first, second);
    assert_eq!(
        first.code,
        "'use strict'\n\nvar path = require('path')\n\nvar main = path.join('a', \
         'b');\n\nmodule.exports = main"
    );
    Ok(())
}
