//! Command-line arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Health Assistant CLI
#[derive(Parser)]
#[command(name = "health-assistant")]
#[command(about = "Healthcare assistant backed by Google Gemini", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Settings file (overrides the per-user settings.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a free-text description of symptoms
    Symptoms { description: String },

    /// Describe one medication, or check interactions between several
    Drugs {
        /// Medication names, space or comma separated
        #[arg(value_delimiter = ',')]
        names: Vec<String>,
    },

    /// Explain a medical term in plain language
    Explain { term: String },

    /// Summarize a medical report read from a text file
    Summarize {
        report: PathBuf,
        /// Skip the medical-report check before summarizing
        #[arg(long)]
        skip_validation: bool,
    },

    /// Ask a general health question
    Ask { question: String },

    /// Ask a question about an insurance policy document
    Policy {
        policy: PathBuf,
        query: String,
        #[arg(long)]
        skip_validation: bool,
    },

    /// Ask a question about a medical report
    Report {
        report: PathBuf,
        query: String,
        #[arg(long)]
        skip_validation: bool,
    },

    /// Analyze a medical image (X-ray, CT, MRI, ECG, ...)
    Image {
        image: PathBuf,
        /// Patient context passed along with the image
        #[arg(long)]
        context: Option<String>,
        #[arg(long)]
        skip_validation: bool,
    },

    /// Identify a medicine from a photo of the pills or packaging
    Medicine {
        image: PathBuf,
        /// Patient information used for patient-specific advice
        #[arg(long)]
        patient_info: Option<String>,
        #[arg(long)]
        skip_validation: bool,
    },

    /// Run a validity check on its own
    Validate {
        #[command(subcommand)]
        target: ValidateTarget,
    },

    /// Interactive chat with streamed replies
    Chat,
}

#[derive(Subcommand)]
pub enum ValidateTarget {
    /// Is this a medical term, condition or code?
    Term { term: String },
    /// Is this a medication name?
    Medication { name: String },
    /// Is this file a medical report?
    Report { file: PathBuf },
    /// Is this file a health insurance policy?
    Policy { file: PathBuf },
    /// Is this a medical image?
    MedicalImage { image: PathBuf },
    /// Is this a picture of a medicine?
    MedicineImage { image: PathBuf },
}
