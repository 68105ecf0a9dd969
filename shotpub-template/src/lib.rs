//! Path template resolution.
//!
//! Publish and work paths are produced from template strings with named
//! placeholders (`{root}`, `{project}`, `{silo}`, `{asset}`, `{subset}`,
//! `{version}`, `{representation}`), optionally zero-padded
//! (`{version:0>3}` renders version 1 as `001`). Master paths are derived
//! from versioned paths by replacing the `v<digits>` folder segment with
//! the fixed `master` segment.

use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;
use thiserror::Error;

/// Environment variables carrying session template variables.
pub mod session_env {
    pub const PROJECT: &str = "AVALON_PROJECT";
    pub const PROJECTS_ROOT: &str = "AVALON_PROJECTS";
    pub const TASK: &str = "AVALON_TASK";
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unclosed placeholder in template at byte {position}")]
    Unclosed { position: usize },

    #[error("unsupported format spec '{spec}' for placeholder '{name}' (only 0>N is supported)")]
    UnsupportedSpec { name: String, spec: String },

    #[error("missing template key '{key}'")]
    MissingKey { key: String },
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(String),
    Field { name: String, pad: Option<usize> },
}

/// A parsed template string.
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
    tokens: Vec<Token>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((pos, ch)) = chars.next() {
            match ch {
                '{' => {
                    if matches!(chars.peek(), Some((_, '{'))) {
                        chars.next();
                        literal.push('{');
                        continue;
                    }
                    if !literal.is_empty() {
                        tokens.push(Token::Literal(std::mem::take(&mut literal)));
                    }
                    let mut field = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        field.push(c);
                    }
                    if !closed {
                        return Err(TemplateError::Unclosed { position: pos });
                    }
                    tokens.push(parse_field(&field)?);
                }
                '}' => {
                    if matches!(chars.peek(), Some((_, '}'))) {
                        chars.next();
                    }
                    literal.push('}');
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            tokens,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholder names in appearance order, duplicates included.
    pub fn fields(&self) -> Vec<&str> {
        self.tokens
            .iter()
            .filter_map(|t| match t {
                Token::Field { name, .. } => Some(name.as_str()),
                Token::Literal(_) => None,
            })
            .collect()
    }

    pub fn format(&self, vars: &TemplateVars) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.source.len());
        for token in &self.tokens {
            match token {
                Token::Literal(s) => out.push_str(s),
                Token::Field { name, pad } => {
                    let value = vars.get(name).ok_or_else(|| TemplateError::MissingKey {
                        key: name.clone(),
                    })?;
                    match (value, pad) {
                        (VarValue::Num(n), Some(width)) => {
                            out.push_str(&format!("{:0>width$}", n, width = width));
                        }
                        (VarValue::Num(n), None) => out.push_str(&n.to_string()),
                        (VarValue::Str(s), Some(width)) => {
                            out.push_str(&format!("{:0>width$}", s, width = width));
                        }
                        (VarValue::Str(s), None) => out.push_str(s),
                    }
                }
            }
        }
        Ok(out)
    }

    pub fn format_path(&self, vars: &TemplateVars) -> Result<Utf8PathBuf, TemplateError> {
        self.format(vars).map(Utf8PathBuf::from)
    }
}

fn parse_field(field: &str) -> Result<Token, TemplateError> {
    let Some((name, spec)) = field.split_once(':') else {
        return Ok(Token::Field {
            name: field.to_string(),
            pad: None,
        });
    };

    let pad = spec
        .strip_prefix("0>")
        .and_then(|w| w.parse::<usize>().ok())
        .ok_or_else(|| TemplateError::UnsupportedSpec {
            name: name.to_string(),
            spec: spec.to_string(),
        })?;

    Ok(Token::Field {
        name: name.to_string(),
        pad: Some(pad),
    })
}

#[derive(Debug, Clone, PartialEq)]
enum VarValue {
    Str(String),
    Num(u64),
}

/// Values for template placeholders.
#[derive(Debug, Clone, Default)]
pub struct TemplateVars(BTreeMap<String, VarValue>);

impl TemplateVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_str(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), VarValue::Str(value.into()));
        self
    }

    pub fn set_num(&mut self, key: impl Into<String>, value: u64) -> &mut Self {
        self.0.insert(key.into(), VarValue::Num(value));
        self
    }

    fn get(&self, key: &str) -> Option<&VarValue> {
        self.0.get(key)
    }
}

/// Session template variables sourced from the environment.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub project: Option<String>,
    pub projects_root: Option<String>,
    pub task: Option<String>,
}

impl Session {
    pub fn from_env(env: &BTreeMap<String, String>) -> Self {
        Self {
            project: env.get(session_env::PROJECT).cloned(),
            projects_root: env.get(session_env::PROJECTS_ROOT).cloned(),
            task: env.get(session_env::TASK).cloned(),
        }
    }

    /// Seed `{root}`, `{project}` and `{task}` from the session where set.
    pub fn apply_to(&self, vars: &mut TemplateVars) {
        if let Some(root) = &self.projects_root {
            vars.set_str("root", root.clone());
        }
        if let Some(project) = &self.project {
            vars.set_str("project", project.clone());
        }
        if let Some(task) = &self.task {
            vars.set_str("task", task.clone());
        }
    }
}

/// True for path segments shaped like `v001`, `v12`, ...
pub fn is_version_segment(segment: &str) -> bool {
    let Some(rest) = segment.strip_prefix('v') else {
        return false;
    };
    !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit())
}

/// Derive the unversioned master path from a versioned publish path.
///
/// The last `v<digits>` folder segment is replaced with `master`. Returns
/// `None` when no version segment is present.
pub fn master_path(path: &Utf8Path) -> Option<Utf8PathBuf> {
    let segments: Vec<&str> = path.components().map(|c| c.as_str()).collect();
    let last_version = segments
        .iter()
        .rposition(|segment| is_version_segment(segment))?;

    let mut out = Utf8PathBuf::new();
    for (idx, segment) in segments.iter().enumerate() {
        if idx == last_version {
            out.push("master");
        } else {
            out.push(segment);
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PUBLISH: &str =
        "{root}/{project}/{asset}/publish/{subset}/v{version:0>3}/{subset}.{representation}";

    fn publish_vars() -> TemplateVars {
        let mut vars = TemplateVars::new();
        vars.set_str("root", "/projects")
            .set_str("project", "hulk")
            .set_str("asset", "shot010")
            .set_str("subset", "renderMain")
            .set_num("version", 1)
            .set_str("representation", "exr");
        vars
    }

    #[test]
    fn version_one_renders_v001() {
        let template = Template::parse(PUBLISH).unwrap();
        let path = template.format(&publish_vars()).unwrap();
        assert_eq!(
            path,
            "/projects/hulk/shot010/publish/renderMain/v001/renderMain.exr"
        );
    }

    #[test]
    fn missing_key_is_named() {
        let template = Template::parse(PUBLISH).unwrap();
        let mut vars = publish_vars();
        vars.0.remove("asset");
        assert_eq!(
            template.format(&vars),
            Err(TemplateError::MissingKey {
                key: "asset".to_string()
            })
        );
    }

    #[test]
    fn fields_are_listed_in_order() {
        let template = Template::parse("{root}/{project}/v{version:0>3}").unwrap();
        assert_eq!(template.fields(), vec!["root", "project", "version"]);
    }

    #[test]
    fn unsupported_spec_is_rejected() {
        let err = Template::parse("{version:>5}").unwrap_err();
        assert!(matches!(err, TemplateError::UnsupportedSpec { .. }));
    }

    #[test]
    fn unclosed_placeholder_is_rejected() {
        let err = Template::parse("{root}/{project").unwrap_err();
        assert!(matches!(err, TemplateError::Unclosed { .. }));
    }

    #[test]
    fn doubled_braces_escape() {
        let template = Template::parse("literal {{root}} and {asset}").unwrap();
        let mut vars = TemplateVars::new();
        vars.set_str("asset", "shot010");
        assert_eq!(
            template.format(&vars).unwrap(),
            "literal {root} and shot010"
        );
    }

    #[test]
    fn wide_versions_are_not_truncated() {
        let template = Template::parse("v{version:0>3}").unwrap();
        let mut vars = TemplateVars::new();
        vars.set_num("version", 1234);
        assert_eq!(template.format(&vars).unwrap(), "v1234");
    }

    #[test]
    fn master_path_replaces_version_segment() {
        let src = Utf8Path::new("/projects/hulk/shot010/publish/renderMain/v012/renderMain.exr");
        assert_eq!(
            master_path(src).unwrap(),
            Utf8PathBuf::from("/projects/hulk/shot010/publish/renderMain/master/renderMain.exr")
        );
    }

    #[test]
    fn master_path_needs_a_version_segment() {
        assert!(master_path(Utf8Path::new("/projects/hulk/latest/renderMain.exr")).is_none());
        // "version" is not v<digits>; neither is a bare "v".
        assert!(master_path(Utf8Path::new("/p/version/v/renderMain.exr")).is_none());
    }

    #[test]
    fn master_path_replaces_only_the_last_version_segment() {
        let src = Utf8Path::new("/p/v002/publish/v010/file.abc");
        assert_eq!(
            master_path(src).unwrap(),
            Utf8PathBuf::from("/p/v002/publish/master/file.abc")
        );
    }

    #[test]
    fn session_seeds_root_and_project() {
        let mut env = BTreeMap::new();
        env.insert(session_env::PROJECT.to_string(), "hulk".to_string());
        env.insert(session_env::PROJECTS_ROOT.to_string(), "/projects".to_string());

        let session = Session::from_env(&env);
        let mut vars = TemplateVars::new();
        session.apply_to(&mut vars);

        let template = Template::parse("{root}/{project}").unwrap();
        assert_eq!(template.format(&vars).unwrap(), "/projects/hulk");
    }
}
