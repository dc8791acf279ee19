use log::debug;

use super::ExportMode;
use crate::{graph::ModuleGraph, snippet::SnippetBundle, types::ModuleId};

/// Wrap `body` as a CommonJS module
///
/// Every external module is required under its assigned name. An external
/// used through its default export gets an interop binding that prefers a
/// `default` property when one exists.
pub fn finalise(graph: &ModuleGraph, entry: ModuleId, body: &mut SnippetBundle, mode: ExportMode) {
    let mut intro = String::from("'use strict'\n\n");

    let requires: Vec<String> = graph
        .externals()
        .iter()
        .map(|external| {
            let name = &external.name;
            let mut require = format!("var {name} = require('{}')", external.specifier);
            if external.needs_default {
                let binding = if external.needs_named {
                    format!("var {name}__default = ")
                } else {
                    format!("{name} = ")
                };
                require.push('\n');
                require.push_str(&binding);
                require.push_str(&format!("'default' in {name} ? {name}['default'] : {name}"));
            }
            require
        })
        .collect();
    if !requires.is_empty() {
        intro.push_str(&requires.join("\n"));
        intro.push_str("\n\n");
    }
    body.prepend(&intro);

    let module = graph.module(entry);
    let exports = match mode {
        ExportMode::Default if module.exports.contains_key("default") => {
            format!("module.exports = {}", module.canonical_name("default", graph))
        }
        ExportMode::Named => module
            .exports
            .iter()
            .map(|(key, export)| {
                format!(
                    "exports.{key} = {}",
                    module.canonical_name(&export.local_name, graph)
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    };
    debug!(
        "CommonJS wrapper: {} requires, {mode} exports",
        requires.len()
    );

    if !exports.is_empty() {
        body.append(&format!("\n\n{exports}"));
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::{deconflict::deconflict, generate::render};

    fn wrap(source: &str, mode: ExportMode) -> Result<String> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("main.js");
        fs::write(&path, source)?;

        let mut graph = ModuleGraph::new();
        let entry = graph.fetch_entry(&path)?;
        let statements = graph.expand_all_statements(entry, true)?;
        deconflict(&mut graph, &statements);
        let mut body = render(&graph, &statements)?;
        finalise(&graph, entry, &mut body, mode);
        Ok(body.to_string())
    }

    #[test]
    fn test_interop_for_default_and_named_access() -> Result<()> {
        let code = wrap(
            "import fs from 'fs';\nimport def, { join } from 'path';\nexport var a = fs(def, \
             join);\n",
            ExportMode::Named,
        )?;
        assert_eq!(
            code,
            "'use strict'\n\nvar fs = require('fs')\nfs = 'default' in fs ? fs['default'] : \
             fs\nvar def = require('path')\nvar def__default = 'default' in def ? def['default'] \
             : def\n\nvar a = fs(def__default, def.join);\n\nexports.a = a"
        );
        Ok(())
    }

    #[test]
    fn test_no_exports_no_wrapper() -> Result<()> {
        let code = wrap("console.log(1);\n", ExportMode::None)?;
        assert_eq!(code, "'use strict'\n\nconsole.log(1);");
        Ok(())
    }
}
