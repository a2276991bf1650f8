//! Template substitution.
//!
//! The assembler turns template text plus a [`FieldValues`] map into either
//! final document text ([`DocumentAssembler::substitute`]) or escaped preview
//! markup ([`DocumentAssembler::highlight_active_field`]).
//!
//! ## Matching
//!
//! All declared field names are combined into a single alternation pattern,
//! each name passed through [`regex::escape`] so characters such as `.`, `+`
//! or `(` in a name match literally. The pattern is applied once to the
//! *original* template text and every match is replaced from that text, never
//! from partially substituted output. A value that happens to contain another
//! field's placeholder is therefore never substituted a second time, and the
//! result does not depend on the order in which fields were filled in.
//!
//! ## Policies
//!
//! - Empty values (blank or whitespace only) render according to
//!   [`EmptyValuePolicy`]; the default is a bracketed field name, `[nom]`.
//! - Placeholders whose name is not declared are left verbatim.

use crate::error::{AskaraError, AskaraResult};
use crate::sanitize::escape_html;
use crate::template::DocumentTemplate;
use askara_types::FieldName;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Placeholder delimiters recognised in template text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderSyntax {
    /// `{{nom}}`
    #[default]
    Curly,
    /// `[nom]`
    Square,
}

impl PlaceholderSyntax {
    pub fn open(&self) -> &'static str {
        match self {
            PlaceholderSyntax::Curly => "{{",
            PlaceholderSyntax::Square => "[",
        }
    }

    pub fn close(&self) -> &'static str {
        match self {
            PlaceholderSyntax::Curly => "}}",
            PlaceholderSyntax::Square => "]",
        }
    }

    /// The literal token for `name`, e.g. `{{nom}}`.
    pub fn token(&self, name: &str) -> String {
        format!("{}{}{}", self.open(), name, self.close())
    }

    /// Pattern matching any well-formed placeholder, declared or not.
    /// Capture group 1 is the name.
    pub(crate) fn any_placeholder(&self) -> AskaraResult<Regex> {
        let pattern = format!(
            r"{}([^\s{{}}\[\]]+){}",
            regex::escape(self.open()),
            regex::escape(self.close())
        );
        Ok(Regex::new(&pattern)?)
    }

    /// Pattern matching exactly the given names. Capture group 1 is the name.
    fn declared_placeholder<'a>(
        &self,
        names: impl IntoIterator<Item = &'a FieldName>,
    ) -> AskaraResult<Option<Regex>> {
        let alternatives: Vec<String> = names
            .into_iter()
            .map(|n| regex::escape(n.as_str()))
            .collect();
        if alternatives.is_empty() {
            return Ok(None);
        }
        let pattern = format!(
            "{}({}){}",
            regex::escape(self.open()),
            alternatives.join("|"),
            regex::escape(self.close())
        );
        Ok(Some(Regex::new(&pattern)?))
    }
}

impl FromStr for PlaceholderSyntax {
    type Err = AskaraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "curly" | "{{}}" => Ok(PlaceholderSyntax::Curly),
            "square" | "[]" => Ok(PlaceholderSyntax::Square),
            other => Err(AskaraError::InvalidInput(format!(
                "unknown placeholder syntax '{other}' (expected curly or square)"
            ))),
        }
    }
}

impl fmt::Display for PlaceholderSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlaceholderSyntax::Curly => "curly",
            PlaceholderSyntax::Square => "square",
        })
    }
}

/// How a field with an empty value is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyValuePolicy {
    /// `[nom]`
    #[default]
    Bracketed,
    /// Nothing at all.
    Blank,
    /// The original placeholder token, e.g. `{{nom}}`.
    Keep,
}

impl FromStr for EmptyValuePolicy {
    type Err = AskaraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bracketed" => Ok(EmptyValuePolicy::Bracketed),
            "blank" => Ok(EmptyValuePolicy::Blank),
            "keep" => Ok(EmptyValuePolicy::Keep),
            other => Err(AskaraError::InvalidInput(format!(
                "unknown empty value policy '{other}' (expected bracketed, blank or keep)"
            ))),
        }
    }
}

/// Per-session map of field name to current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldValues(BTreeMap<FieldName, String>);

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// One empty entry per distinct field declared by `template`.
    pub fn for_template(template: &DocumentTemplate) -> Self {
        Self(
            template
                .field_names()
                .into_iter()
                .map(|name| (name.clone(), String::new()))
                .collect(),
        )
    }

    pub fn set(&mut self, name: FieldName, value: impl Into<String>) {
        self.0.insert(name, value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &FieldName> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldName, &str)> {
        self.0.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(FieldName, String)> for FieldValues {
    fn from_iter<T: IntoIterator<Item = (FieldName, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A piece of parsed template text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Field(&'a str),
}

/// Substitutes field values into template text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentAssembler {
    syntax: PlaceholderSyntax,
    empty_policy: EmptyValuePolicy,
}

impl DocumentAssembler {
    pub fn new(syntax: PlaceholderSyntax, empty_policy: EmptyValuePolicy) -> Self {
        Self {
            syntax,
            empty_policy,
        }
    }

    pub fn syntax(&self) -> PlaceholderSyntax {
        self.syntax
    }

    pub fn empty_policy(&self) -> EmptyValuePolicy {
        self.empty_policy
    }

    /// This assembler switched to the syntax `template` is written in.
    pub fn for_template(self, template: &DocumentTemplate) -> Self {
        Self {
            syntax: template.syntax_or(self.syntax),
            ..self
        }
    }

    /// Splits `content` into literal text and placeholders for the `declared` names.
    ///
    /// Placeholders for undeclared names stay inside literal segments.
    pub fn segments<'a, 'n>(
        &self,
        content: &'a str,
        declared: impl IntoIterator<Item = &'n FieldName>,
    ) -> AskaraResult<Vec<Segment<'a>>> {
        let Some(pattern) = self.syntax.declared_placeholder(declared)? else {
            return Ok(vec![Segment::Literal(content)]);
        };

        let mut segments = Vec::new();
        let mut last = 0;
        for caps in pattern.captures_iter(content) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if whole.start() > last {
                segments.push(Segment::Literal(&content[last..whole.start()]));
            }
            segments.push(Segment::Field(name.as_str()));
            last = whole.end();
        }
        if last < content.len() {
            segments.push(Segment::Literal(&content[last..]));
        }
        Ok(segments)
    }

    /// Replaces every placeholder named in `values` with its value.
    ///
    /// The keys of `values` are the declared fields; an empty value renders
    /// according to the configured [`EmptyValuePolicy`].
    pub fn substitute(&self, content: &str, values: &FieldValues) -> AskaraResult<String> {
        let segments = self.segments(content, values.names())?;
        Ok(self.join_plain(&segments, values))
    }

    /// Substitutes using the template's own declared fields and syntax.
    /// Declared fields missing from `values` are treated as empty.
    pub fn render(
        &self,
        template: &DocumentTemplate,
        values: &FieldValues,
    ) -> AskaraResult<String> {
        let assembler = self.for_template(template);
        let segments = assembler.segments(&template.content, template.field_names())?;
        Ok(assembler.join_plain(&segments, values))
    }

    /// Builds escaped preview markup for `content`.
    ///
    /// Literal text and values are HTML-escaped. Each substituted value is
    /// wrapped in `<span class="field-value" data-field="…">`; the value of
    /// `active` is wrapped in `<mark class="active-field" data-field="…">`
    /// instead; empty values render as `<span class="placeholder" …>`.
    pub fn highlight_active_field(
        &self,
        content: &str,
        values: &FieldValues,
        active: Option<&str>,
    ) -> AskaraResult<String> {
        let segments = self.segments(content, values.names())?;
        let mut out = String::with_capacity(content.len() * 2);
        for segment in segments {
            match segment {
                Segment::Literal(text) => out.push_str(&escape_html(text)),
                Segment::Field(name) => {
                    let value = values.get(name).unwrap_or_default();
                    let attr = escape_html(name);
                    let is_active = active == Some(name);
                    if value.trim().is_empty() {
                        let class = if is_active {
                            "placeholder active-field"
                        } else {
                            "placeholder"
                        };
                        let shown = match self.empty_policy {
                            EmptyValuePolicy::Blank => String::new(),
                            _ => self.empty_text(name),
                        };
                        out.push_str(&format!(
                            r#"<span class="{class}" data-field="{attr}">{}</span>"#,
                            escape_html(&shown)
                        ));
                    } else if is_active {
                        out.push_str(&format!(
                            r#"<mark class="active-field" data-field="{attr}">{}</mark>"#,
                            escape_html(value)
                        ));
                    } else {
                        out.push_str(&format!(
                            r#"<span class="field-value" data-field="{attr}">{}</span>"#,
                            escape_html(value)
                        ));
                    }
                }
            }
        }
        Ok(out)
    }

    /// Names of every well-formed placeholder in `content`, in order of
    /// appearance, declared or not.
    pub fn placeholders_in(&self, content: &str) -> AskaraResult<Vec<String>> {
        let pattern = self.syntax.any_placeholder()?;
        Ok(pattern
            .captures_iter(content)
            .filter_map(|c| c.get(1).map(|m| m.as_str().to_owned()))
            .collect())
    }

    fn join_plain(&self, segments: &[Segment<'_>], values: &FieldValues) -> String {
        let mut out = String::new();
        for segment in segments {
            match *segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(name) => match values.get(name) {
                    Some(value) if !value.trim().is_empty() => out.push_str(value),
                    _ => out.push_str(&self.empty_text(name)),
                },
            }
        }
        out
    }

    fn empty_text(&self, name: &str) -> String {
        match self.empty_policy {
            EmptyValuePolicy::Bracketed => format!("[{name}]"),
            EmptyValuePolicy::Blank => String::new(),
            EmptyValuePolicy::Keep => self.syntax.token(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin_templates;

    fn name(s: &str) -> FieldName {
        FieldName::new(s).unwrap()
    }

    fn values(pairs: &[(&str, &str)]) -> FieldValues {
        pairs
            .iter()
            .map(|(k, v)| (name(k), v.to_string()))
            .collect()
    }

    fn square() -> DocumentAssembler {
        DocumentAssembler::new(PlaceholderSyntax::Square, EmptyValuePolicy::Bracketed)
    }

    #[test]
    fn test_appointment_example_substitutes_all_fields() {
        let out = square()
            .substitute(
                "Bonjour [nom], vous avez RDV le [date].",
                &values(&[("nom", "Durand"), ("date", "12/06")]),
            )
            .unwrap();
        assert_eq!(out, "Bonjour Durand, vous avez RDV le 12/06.");
    }

    #[test]
    fn test_appointment_example_keeps_visible_placeholder_for_empty_value() {
        let out = square()
            .substitute(
                "Bonjour [nom], vous avez RDV le [date].",
                &values(&[("nom", ""), ("date", "12/06")]),
            )
            .unwrap();
        assert_eq!(out, "Bonjour [nom], vous avez RDV le 12/06.");
    }

    #[test]
    fn test_curly_syntax_repeated_occurrences() {
        let out = DocumentAssembler::default()
            .substitute(
                "{{nom}} / {{nom}} / {{date}}",
                &values(&[("nom", "Durand"), ("date", "12/06")]),
            )
            .unwrap();
        assert_eq!(out, "Durand / Durand / 12/06");
    }

    #[test]
    fn test_field_names_with_regex_metacharacters_match_literally() {
        let assembler = DocumentAssembler::default();
        let v = values(&[("a.b", "DOT"), ("x(1)", "PAREN"), ("num-secu", "SECU"), ("c+", "PLUS")]);
        let out = assembler
            .substitute("{{a.b}} {{axb}} {{x(1)}} {{num-secu}} {{c+}} {{cc}}", &v)
            .unwrap();
        assert_eq!(out, "DOT {{axb}} PAREN SECU PLUS {{cc}}");
    }

    #[test]
    fn test_undeclared_placeholders_are_left_verbatim() {
        let out = DocumentAssembler::default()
            .substitute("{{nom}} {{inconnu}}", &values(&[("nom", "Durand")]))
            .unwrap();
        assert_eq!(out, "Durand {{inconnu}}");
    }

    #[test]
    fn test_value_containing_another_placeholder_is_not_resubstituted() {
        let v = values(&[("a", "{{b}}"), ("b", "B")]);
        let out = DocumentAssembler::default().substitute("{{a}}-{{b}}", &v).unwrap();
        assert_eq!(out, "{{b}}-B");
    }

    #[test]
    fn test_overlapping_names_are_order_independent() {
        let content = "{{nom}} {{nom_complet}} {{nom}}";
        let forward = values(&[("nom", "D"), ("nom_complet", "Jean Durand")]);
        let mut backward = FieldValues::new();
        backward.set(name("nom_complet"), "Jean Durand");
        backward.set(name("nom"), "D");

        let assembler = DocumentAssembler::default();
        let a = assembler.substitute(content, &forward).unwrap();
        let b = assembler.substitute(content, &backward).unwrap();
        assert_eq!(a, "D Jean Durand D");
        assert_eq!(a, b);
    }

    #[test]
    fn test_substitute_is_idempotent() {
        let assembler = DocumentAssembler::default();
        let v = values(&[("nom", "Durand"), ("date", "")]);
        let once = assembler.substitute("{{nom}} le {{date}}", &v).unwrap();
        let twice = assembler.substitute(&once, &v).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_value_policies() {
        let v = values(&[("nom", "  ")]);
        let content = "<{{nom}}>";
        let render = |p| {
            DocumentAssembler::new(PlaceholderSyntax::Curly, p)
                .substitute(content, &v)
                .unwrap()
        };
        assert_eq!(render(EmptyValuePolicy::Bracketed), "<[nom]>");
        assert_eq!(render(EmptyValuePolicy::Blank), "<>");
        assert_eq!(render(EmptyValuePolicy::Keep), "<{{nom}}>");
    }

    #[test]
    fn test_render_treats_missing_declared_values_as_empty() {
        let template = builtin_templates()
            .into_iter()
            .find(|t| t.id == "rappel-rdv")
            .unwrap();
        let out = DocumentAssembler::default()
            .render(&template, &FieldValues::new())
            .unwrap();
        assert!(out.contains("[nom_patient]"));
        assert!(!out.contains("{{"));
    }

    #[test]
    fn test_render_uses_the_template_syntax() {
        let template = builtin_templates()
            .into_iter()
            .find(|t| t.id == "rappel-rdv")
            .unwrap();
        let out = square()
            .render(&template, &values(&[("nom_patient", "Durand")]))
            .unwrap();
        assert!(out.starts_with("Bonjour Durand,"));
        assert!(!out.contains("{{"));
    }

    #[test]
    fn test_full_catalog_leaves_no_declared_tokens() {
        let assembler = DocumentAssembler::default();
        for template in builtin_templates() {
            let mut v = FieldValues::for_template(&template);
            for field in template.field_names() {
                v.set(field.clone(), format!("valeur-{field}"));
            }
            let out = assembler.substitute(&template.content, &v).unwrap();
            for field in template.field_names() {
                assert!(
                    !out.contains(&PlaceholderSyntax::Curly.token(field.as_str())),
                    "{} still contains {field}",
                    template.id
                );
            }
            assert_eq!(out, assembler.substitute(&out, &v).unwrap());
        }
    }

    #[test]
    fn test_all_empty_values_preserve_structure_without_error() {
        let assembler = DocumentAssembler::default();
        for template in builtin_templates() {
            let v = FieldValues::for_template(&template);
            let out = assembler.substitute(&template.content, &v).unwrap();
            for field in template.field_names() {
                assert!(out.contains(&format!("[{field}]")));
            }
        }
    }

    #[test]
    fn test_no_declared_fields_returns_content_unchanged() {
        let out = DocumentAssembler::default()
            .substitute("Texte libre {{x}}", &FieldValues::new())
            .unwrap();
        assert_eq!(out, "Texte libre {{x}}");
    }

    #[test]
    fn test_highlight_wraps_active_and_escapes_values() {
        let v = values(&[("nom", "<mark>Durand</mark>"), ("date", "12/06"), ("motif", "")]);
        let html = DocumentAssembler::default()
            .highlight_active_field("A & {{nom}} {{date}} {{motif}}", &v, Some("nom"))
            .unwrap();
        assert_eq!(
            html,
            concat!(
                "A &amp; ",
                r#"<mark class="active-field" data-field="nom">&lt;mark&gt;Durand&lt;/mark&gt;</mark> "#,
                r#"<span class="field-value" data-field="date">12/06</span> "#,
                r#"<span class="placeholder" data-field="motif">[motif]</span>"#
            )
        );
    }

    #[test]
    fn test_highlight_marks_empty_active_field() {
        let v = values(&[("nom", "")]);
        let html = DocumentAssembler::default()
            .highlight_active_field("{{nom}}", &v, Some("nom"))
            .unwrap();
        assert_eq!(
            html,
            r#"<span class="placeholder active-field" data-field="nom">[nom]</span>"#
        );
    }

    #[test]
    fn test_placeholders_in_lists_all_tokens() {
        let found = DocumentAssembler::default()
            .placeholders_in("{{a}} {b} {{ c }} {{d-e}} {{a}}")
            .unwrap();
        assert_eq!(found, vec!["a", "d-e", "a"]);
    }

    #[test]
    fn test_syntax_and_policy_from_str() {
        assert_eq!("Square".parse::<PlaceholderSyntax>().unwrap(), PlaceholderSyntax::Square);
        assert_eq!("blank".parse::<EmptyValuePolicy>().unwrap(), EmptyValuePolicy::Blank);
        assert!("angle".parse::<PlaceholderSyntax>().is_err());
        assert!("nothing".parse::<EmptyValuePolicy>().is_err());
    }
}
