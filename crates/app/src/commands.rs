//! Command execution. Output goes to stdout, diagnostics to stderr.

use anyhow::{bail, Context, Result};
use futures::StreamExt;
use orchestrator::{ChatSession, MedicalAssistant};
use providers::ImagePayload;
use serde_json::json;
use shared::validation::ValidationResult;
use std::fs;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::cli::{Commands, ValidateTarget};

/// Used when the extension does not name an image type.
const FALLBACK_IMAGE_MIME: &str = "image/jpeg";

pub async fn run(command: Commands, assistant: &MedicalAssistant) -> Result<()> {
    match command {
        Commands::Symptoms { description } => {
            print_text(assistant.analyze_symptoms(&description).await?)
        }
        Commands::Drugs { names } => {
            let names: Vec<String> = names
                .into_iter()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect();
            print_text(assistant.check_drug_interaction(&names).await?)
        }
        Commands::Explain { term } => print_text(assistant.explain_medical_term(&term).await?),
        Commands::Summarize {
            report,
            skip_validation,
        } => {
            let text = read_text(&report)?;
            if !skip_validation && !assistant.validate_medical_report(&text).await {
                bail!("{} does not look like a medical report", report.display());
            }
            print_text(assistant.summarize_medical_report(&text).await?)
        }
        Commands::Ask { question } => print_text(assistant.get_ai_response(&question).await?),
        Commands::Policy {
            policy,
            query,
            skip_validation,
        } => {
            let text = read_text(&policy)?;
            if !skip_validation && !assistant.validate_policy_document(&text).await {
                bail!(
                    "{} does not look like a health insurance policy",
                    policy.display()
                );
            }
            print_text(assistant.query_policy_document(&query, &text).await?)
        }
        Commands::Report {
            report,
            query,
            skip_validation,
        } => {
            let text = read_text(&report)?;
            if !skip_validation && !assistant.validate_medical_report(&text).await {
                bail!("{} does not look like a medical report", report.display());
            }
            print_text(assistant.query_medical_report(&query, &text).await?)
        }
        Commands::Image {
            image,
            context,
            skip_validation,
        } => {
            let payload = load_image(&image)?;
            if !skip_validation {
                require_valid(assistant.validate_medical_image(&payload).await)?;
            }
            let analysis = assistant
                .analyze_medical_image(&payload, context.as_deref())
                .await?;
            print_json(&analysis)
        }
        Commands::Medicine {
            image,
            patient_info,
            skip_validation,
        } => {
            let payload = load_image(&image)?;
            if !skip_validation {
                require_valid(assistant.validate_medicine_image(&payload).await)?;
            }
            let analysis = assistant
                .analyze_medicine(&payload, patient_info.as_deref())
                .await?;
            print_json(&analysis)
        }
        Commands::Validate { target } => validate(target, assistant).await,
        Commands::Chat => chat(assistant.clone()).await,
    }
}

async fn validate(target: ValidateTarget, assistant: &MedicalAssistant) -> Result<()> {
    let verdict = match target {
        ValidateTarget::Term { term } => assistant.validate_medical_term(&term).await,
        ValidateTarget::Medication { name } => assistant.validate_medication_name(&name).await,
        ValidateTarget::Report { file } => {
            assistant.validate_medical_report(&read_text(&file)?).await
        }
        ValidateTarget::Policy { file } => {
            assistant.validate_policy_document(&read_text(&file)?).await
        }
        ValidateTarget::MedicalImage { image } => {
            return print_json(&assistant.validate_medical_image(&load_image(&image)?).await)
        }
        ValidateTarget::MedicineImage { image } => {
            return print_json(&assistant.validate_medicine_image(&load_image(&image)?).await)
        }
    };
    print_json(&json!({ "isValid": verdict }))
}

/// Read lines from stdin and stream each reply. Ctrl-C stops the reply in
/// progress; at the prompt it quits.
async fn chat(assistant: MedicalAssistant) -> Result<()> {
    let session = ChatSession::new(assistant);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    eprintln!("Ask a health question. /clear resets the conversation, Ctrl-C stops a reply, Ctrl-D quits.");

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };
        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/clear" => {
                session.clear();
                continue;
            }
            _ => {}
        }

        let mut reply = match session.send(line.trim()) {
            Ok(stream) => stream,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => session.cancel_current(),
                next = reply.next() => match next {
                    Some(Ok(fragment)) => {
                        stdout.write_all(fragment.as_bytes()).await?;
                        stdout.flush().await?;
                    }
                    Some(Err(e)) => {
                        stdout.write_all(b"\n").await?;
                        eprintln!("{}", e);
                        break;
                    }
                    None => break,
                },
            }
        }
        stdout.write_all(b"\n").await?;
    }
    Ok(())
}

fn require_valid(result: ValidationResult) -> Result<()> {
    if result.is_valid {
        eprintln!("{}", result.message);
        Ok(())
    } else {
        bail!("{}", result.message)
    }
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn image_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .filter(|m| m.type_() == mime_guess::mime::IMAGE)
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| FALLBACK_IMAGE_MIME.to_string())
}

fn load_image(path: &Path) -> Result<ImagePayload> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(ImagePayload::from_bytes(&bytes, image_mime(path)))
}

fn print_text(text: String) -> Result<()> {
    println!("{}", text.trim_end());
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_mime_from_extension() {
        assert_eq!(image_mime(Path::new("scan.png")), "image/png");
        assert_eq!(image_mime(Path::new("pill.JPG")), "image/jpeg");
        assert_eq!(image_mime(Path::new("ecg.webp")), "image/webp");
    }

    #[test]
    fn test_non_image_extension_falls_back() {
        assert_eq!(image_mime(Path::new("notes.txt")), FALLBACK_IMAGE_MIME);
        assert_eq!(image_mime(Path::new("upload")), FALLBACK_IMAGE_MIME);
    }

    #[test]
    fn test_load_image_encodes_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xray.png");
        fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();
        let payload = load_image(&path).unwrap();
        assert_eq!(payload.mime_type, "image/png");
        assert_eq!(payload.data, "iVBORw==");
    }

    #[test]
    fn test_rejected_image_stops_analysis() {
        let err = require_valid(ValidationResult::rejected(
            "This doesn't appear to be a medical image. Detected: Photo.",
        ))
        .unwrap_err();
        assert!(err.to_string().starts_with("This doesn't appear"));
        assert!(require_valid(ValidationResult::accepted("ok", None)).is_ok());
    }
}
