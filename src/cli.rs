//! Minimal CLI: catalogs → schema document(s)
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use regex::Regex;

use crate::catalog::{Catalog, MemberOrder};
use crate::describe::TypeRef;
use crate::registry::{generate, SchemaDocument};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate JSON schemas for configuration/content types described by type catalogs
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// more logging (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// generate one schema document for a single root type
    Schema(SchemaOut),
    /// generate one schema document per root type into a directory
    Split(SplitOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more catalog files. May be literal paths or quoted glob patterns
    #[arg(long = "catalog", short = 'i', num_args = 1.., required = true)]
    input: Vec<String>,

    /// JQ pre-process filter for each catalog document; every output is a catalog.
    #[arg(long)]
    jq_expr: Option<String>,

    /// where inherited members go in `properties`
    #[arg(long, value_enum, default_value_t = MemberOrder::BaseFirst)]
    member_order: MemberOrder,
}

#[derive(Args, Debug, Clone)]
struct RootSelection {
    /// root type expression(s), e.g. `Game.FishConfig` or `List<Game.FishEntry>`
    #[arg(long)]
    root: Vec<TypeRef>,

    /// use every declared type whose name matches this regex as a root
    #[arg(long, conflicts_with = "root")]
    roots_matching: Option<String>,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    roots: RootSelection,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// single-line JSON
    #[arg(long)]
    compact: bool,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct SplitOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    roots: RootSelection,

    /// directory receiving `<root>.schema.json` files
    #[arg(long)]
    out_dir: PathBuf,

    /// single-line JSON
    #[arg(long)]
    compact: bool,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_catalog(&self) -> Result<Catalog> {
        let mut catalog = Catalog::new().with_member_order(self.member_order);
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve catalog paths")?;
        for source_path in source_paths {
            let origin = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read catalog file ({origin})"))?;
            match self.jq_expr.as_ref() {
                None => {
                    catalog.merge(Catalog::parse_file(&origin, &source)?)?;
                }
                Some(jq_expr) => {
                    let json_value = serde_json::from_str::<serde_json::Value>(&source)
                        .with_context(|| format!("failed to parse JSON catalog file ({origin})"))?;
                    let docs = crate::jq_exec::run_jaq(jq_expr, &json_value).with_context(|| {
                        format!("failed to apply jq expression to catalog file ({origin})")
                    })?;
                    for doc in docs {
                        catalog.merge(Catalog::parse_value(&origin, doc)?)?;
                    }
                }
            }
            tracing::info!(catalog = %origin, "loaded catalog");
        }
        catalog.validate()?;
        Ok(catalog)
    }
}

impl RootSelection {
    fn resolve(&self, catalog: &Catalog) -> Result<Vec<TypeRef>> {
        if !self.root.is_empty() {
            return Ok(self.root.clone());
        }
        if let Some(pattern) = self.roots_matching.as_ref() {
            let re = Regex::new(pattern).with_context(|| format!("invalid --roots-matching regex `{pattern}`"))?;
            let roots: Vec<TypeRef> = catalog
                .type_names()
                .filter(|name| re.is_match(name))
                .map(TypeRef::named)
                .collect();
            if roots.is_empty() {
                bail!("no declared type matches `{pattern}`");
            }
            return Ok(roots);
        }
        if catalog.roots().is_empty() {
            bail!("no root types: pass --root or --roots-matching, or list `roots` in a catalog");
        }
        Ok(catalog.roots().to_vec())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Schema(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                let catalog = target.input_settings.load_catalog()?;
                let roots = target.roots.resolve(&catalog)?;
                let [root] = roots.as_slice() else {
                    bail!(
                        "`schema` needs exactly one root type, found {}; use `split` for several",
                        roots.len()
                    );
                };
                let document = generate(&catalog, root)
                    .with_context(|| format!("failed to generate schema for `{root}`"))?;
                tracing::info!(root = %root, definitions = document.definitions.len(), "generated schema");
                let schema_src = render(&document, target.compact)?;
                write_output(target.out.as_deref(), &schema_src)
            }
            Command::Split(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                let catalog = target.input_settings.load_catalog()?;
                let roots = target.roots.resolve(&catalog)?;
                let paths = output_paths(&target.out_dir, &roots)?;

                // one registry per root; nothing is written unless every root succeeds
                let documents = roots
                    .par_iter()
                    .map(|root| {
                        generate(&catalog, root)
                            .map(|doc| (root, doc))
                            .with_context(|| format!("failed to generate schema for `{root}`"))
                    })
                    .collect::<Result<Vec<_>>>()?;

                std::fs::create_dir_all(&target.out_dir).with_context(|| {
                    format!("failed to create output directory {}", target.out_dir.display())
                })?;
                for ((root, document), path) in documents.into_iter().zip(paths) {
                    let schema_src = render(&document, target.compact)?;
                    write_output(Some(&path), &schema_src)?;
                    tracing::info!(root = %root, path = %path.display(), "wrote schema");
                }
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn render(document: &SchemaDocument, compact: bool) -> Result<String> {
    let value = document.to_json();
    let text = if compact {
        serde_json::to_string(&value)?
    } else {
        serde_json::to_string_pretty(&value)?
    };
    Ok(text)
}

fn write_output(out: Option<&Path>, text: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, text).with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

/// `List<Game.Fish?>` → `List_Game.Fish_.schema.json`
fn schema_file_name(root: &TypeRef) -> String {
    let mut stem = String::new();
    for c in root.to_string().chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            stem.push(c);
        } else if !stem.ends_with('_') {
            stem.push('_');
        }
    }
    format!("{stem}.schema.json")
}

/// One output path per root; two roots sharing a file name is an error.
fn output_paths(out_dir: &Path, roots: &[TypeRef]) -> Result<Vec<PathBuf>> {
    let mut claimed = HashMap::<String, &TypeRef>::new();
    let mut out = Vec::with_capacity(roots.len());
    for root in roots {
        let file_name = schema_file_name(root);
        if let Some(other) = claimed.insert(file_name.clone(), root) {
            bail!("roots `{other}` and `{root}` would both be written to {file_name}");
        }
        out.push(out_dir.join(file_name));
    }
    Ok(out)
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_filesystem_safe() {
        let root: TypeRef = "List<Game.Fish?>".parse().unwrap();
        assert_eq!(schema_file_name(&root), "List_Game.Fish_.schema.json");
        let root: TypeRef = "Game.FishConfig".parse().unwrap();
        assert_eq!(schema_file_name(&root), "Game.FishConfig.schema.json");
    }

    #[test]
    fn colliding_file_names_are_rejected_before_writing() {
        let roots: Vec<TypeRef> = ["List<Game.Fish>", "List<Game.Fish>?"]
            .iter()
            .map(|src| src.parse().unwrap())
            .collect();
        let err = output_paths(Path::new("out"), &roots).unwrap_err();
        assert!(err.to_string().contains("List_Game.Fish_.schema.json"), "{err}");

        let roots = vec![TypeRef::named("Game.A"), TypeRef::named("Game.B")];
        let paths = output_paths(Path::new("out"), &roots).unwrap();
        assert_eq!(
            paths,
            vec![PathBuf::from("out/Game.A.schema.json"), PathBuf::from("out/Game.B.schema.json")]
        );
    }

    #[test]
    fn explicit_roots_win_over_catalog_roots() {
        let catalog = Catalog::from_json_str(
            r#"{"roots": ["A"], "types": [
                {"name": "A", "kind": "object"},
                {"name": "Game.B", "kind": "object"},
                {"name": "Game.C", "kind": "enum", "variants": ["X"]}]}"#,
        )
        .unwrap();

        let from_catalog = RootSelection { root: vec![], roots_matching: None };
        assert_eq!(from_catalog.resolve(&catalog).unwrap(), vec![TypeRef::named("A")]);

        let explicit = RootSelection { root: vec![TypeRef::named("Game.B")], roots_matching: None };
        assert_eq!(explicit.resolve(&catalog).unwrap(), vec![TypeRef::named("Game.B")]);

        let matching = RootSelection { root: vec![], roots_matching: Some(r"^Game\.".into()) };
        assert_eq!(
            matching.resolve(&catalog).unwrap(),
            vec![TypeRef::named("Game.B"), TypeRef::named("Game.C")]
        );

        let nothing = RootSelection { root: vec![], roots_matching: Some("^Zzz".into()) };
        assert!(nothing.resolve(&catalog).is_err());
    }

    #[test]
    fn cli_parses_split_invocation() {
        let cli = CommandLineInterface::try_parse_from([
            "schema-gen",
            "-vv",
            "split",
            "-i",
            "fixtures/*.catalog.json",
            "--root",
            "Dictionary<string, Game.Fish>",
            "--out-dir",
            "out",
            "--member-order",
            "declared-first",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Split(split) = &cli.cmd else {
            panic!("expected split");
        };
        assert_eq!(split.input_settings.member_order, MemberOrder::DeclaredFirst);
        assert_eq!(split.roots.root[0].to_string(), "Dictionary<string, Game.Fish>");
    }
}
