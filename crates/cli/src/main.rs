use clap::{Parser, Subcommand};
use std::path::PathBuf;

use askara_core::config::{
    empty_value_policy_from_env_value, placeholder_syntax_from_env_value, resolve_template_dir,
};
use askara_core::constants::DEFAULT_DATA_DIR;
use askara_core::{CoreConfig, DocumentService, EditingSession, FieldName, SaveMeta};

#[derive(Parser)]
#[command(name = "askara")]
#[command(about = "Askara medical document templates CLI")]
struct Cli {
    /// Directory for saved documents and preferences
    #[arg(long, global = true, env = "ASKARA_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,
    /// Directory of YAML templates (built-in catalog when absent)
    #[arg(long, global = true, env = "ASKARA_TEMPLATE_DIR")]
    template_dir: Option<PathBuf>,
    /// Default placeholder syntax for templates that set none: curly ({{name}}) or square ([name])
    #[arg(long, global = true, env = "ASKARA_PLACEHOLDER_SYNTAX")]
    syntax: Option<String>,
    /// Rendering of empty fields: bracketed, blank or keep
    #[arg(long, global = true, env = "ASKARA_EMPTY_FIELDS")]
    empty_fields: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List templates
    Templates {
        /// Only templates with this tag (case-insensitive)
        #[arg(long)]
        tag: Option<String>,
    },
    /// Show a template's fields and content
    Show {
        /// Template id
        id: String,
    },
    /// Fill a template and print the result
    Render {
        /// Template id
        id: String,
        /// Field value as name=value (repeatable)
        #[arg(long = "set", value_parser = parse_assignment)]
        values: Vec<(String, String)>,
        /// Field to highlight in the HTML preview
        #[arg(long)]
        active: Option<String>,
        /// Print the highlighted HTML preview instead of plain text
        #[arg(long)]
        html: bool,
    },
    /// Fill a template, save it as a document and export it to PDF
    Export {
        /// Template id
        id: String,
        /// Field value as name=value (repeatable)
        #[arg(long = "set", value_parser = parse_assignment)]
        values: Vec<(String, String)>,
        /// Document title (defaults to the template name)
        #[arg(long)]
        title: Option<String>,
        /// Author recorded on the saved document
        #[arg(long, default_value = "cli")]
        created_by: String,
        /// Output file (defaults to document-<title>.pdf)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List saved documents
    Documents,
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))
}

fn open_session(
    service: &DocumentService,
    id: &str,
    values: Vec<(String, String)>,
) -> Result<EditingSession, Box<dyn std::error::Error>> {
    let mut session = service
        .open_session(id)
        .ok_or_else(|| format!("unknown template '{id}'"))?;
    for (name, value) in values {
        session.set_value(&name, value)?;
    }
    Ok(session)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'askara --help' for commands");
        return Ok(());
    };

    let cfg = CoreConfig::new(
        cli.data_dir,
        resolve_template_dir(cli.template_dir)?,
        placeholder_syntax_from_env_value(cli.syntax)?,
        empty_value_policy_from_env_value(cli.empty_fields)?,
    )?;
    let service = DocumentService::from_config(&cfg)?;

    match command {
        Commands::Templates { tag } => {
            let templates = match tag {
                Some(tag) => service.templates_by_tag(&tag),
                None => service.templates(),
            };
            if templates.is_empty() {
                println!("No templates found.");
            }
            for t in templates {
                println!("{:<28} {:<32} [{}]", t.id, t.name, t.tags.join(", "));
            }
        }
        Commands::Show { id } => {
            let t = service
                .template(&id)
                .ok_or_else(|| format!("unknown template '{id}'"))?;
            println!("{} ({})", t.name, t.category);
            if !t.description.is_empty() {
                println!("{}", t.description);
            }
            println!();
            for name in t.field_names() {
                let label = t.field(name.as_str()).map(|f| f.display_label()).unwrap_or_default();
                println!("  {:<24} {}", name, label);
            }
            println!();
            println!("{}", t.content);
        }
        Commands::Render {
            id,
            values,
            active,
            html,
        } => {
            let mut session = open_session(&service, &id, values)?;
            session.set_active(active.as_deref())?;
            if html {
                println!("{}", session.preview_html()?);
            } else {
                println!("{}", session.assembled_text()?);
            }
            let missing: Vec<&FieldName> = session.missing_fields();
            if !missing.is_empty() {
                let names: Vec<&str> = missing.iter().map(|n| n.as_str()).collect();
                eprintln!("Missing fields: {}", names.join(", "));
            }
        }
        Commands::Export {
            id,
            values,
            title,
            created_by,
            out,
        } => {
            let session = open_session(&service, &id, values)?;
            let doc = service.save_session(
                &session,
                SaveMeta {
                    title,
                    created_by,
                    ..SaveMeta::default()
                },
            )?;
            let pdf = service.export_pdf(&doc.id)?;
            let out = out.unwrap_or_else(|| PathBuf::from(&pdf.filename));
            std::fs::write(&out, &pdf.bytes)?;
            println!("Saved document {} and wrote {}", doc.id, out.display());
        }
        Commands::Documents => {
            let documents = service.documents()?;
            if documents.is_empty() {
                println!("No documents found.");
            }
            for doc in documents {
                println!(
                    "ID: {}, Title: {}, Status: {}, Updated: {}",
                    doc.id,
                    doc.title,
                    doc.status,
                    doc.updated_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("nom=Mme Durand").unwrap(),
            ("nom".to_string(), "Mme Durand".to_string())
        );
        assert_eq!(
            parse_assignment("note=a=b").unwrap(),
            ("note".to_string(), "a=b".to_string())
        );
        assert!(parse_assignment("nom").is_err());
        assert!(parse_assignment("=x").is_err());
    }

    #[test]
    fn test_cli_parses_render_command() {
        let cli = Cli::try_parse_from([
            "askara", "render", "rappel-rdv", "--set", "nom_patient=Durand", "--active",
            "nom_patient", "--html",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Render {
                id, values, html, ..
            }) => {
                assert_eq!(id, "rappel-rdv");
                assert_eq!(values.len(), 1);
                assert!(html);
            }
            _ => panic!("expected render command"),
        }
    }
}
