//! The single-DOI pipeline.
//!
//! [`Pipeline::run`] takes one DOI from identifier to written note:
//!
//! 1. fetch the record from the registry
//! 2. classify it, or use the forced type
//! 3. report type-specific fields the record lacks
//! 4. load the template for the type
//! 5. acquire the PDF (best-effort)
//! 6. render the note and write it into the notes tree
//!
//! Any error before the note is written aborts the run for that DOI. PDF problems are
//! only warnings.

use chrono::Local;

use super::*;
use crate::{
  bibtex::missing_fields,
  classify::classify,
  config::Settings,
  fetcher::MetadataClient,
  organizer::Organizer,
  pdf::{PdfAcquirer, PdfChoice, PdfOutcome},
  template::{RenderContext, Template},
};

/// Parameters for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
  /// The DOI to import
  pub doi:        Doi,
  /// Type to use instead of the classifier's choice
  pub force_type: Option<PublicationType>,
  /// What to do about the PDF
  pub pdf:        PdfChoice,
}

impl Request {
  /// A request with the default behaviour: classify, then try to download the PDF.
  pub fn new(doi: Doi) -> Self { Self { doi, force_type: None, pdf: PdfChoice::Download } }

  /// Renders the note as `kind` regardless of the registry type.
  pub fn with_force_type(mut self, kind: Option<PublicationType>) -> Self {
    self.force_type = kind;
    self
  }

  /// Sets how the PDF is obtained.
  pub fn with_pdf(mut self, pdf: PdfChoice) -> Self {
    self.pdf = pdf;
    self
  }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
  /// Where the note was written
  pub note_path:      PathBuf,
  /// The BibTeX entry embedded in the note
  pub bibtex:         String,
  /// The type the note was rendered as
  pub kind:           PublicationType,
  /// What happened with the PDF
  pub pdf:            PdfOutcome,
  /// Type-specific fields the record could not fill
  pub missing_fields: Vec<&'static str>,
}

/// Everything needed to import DOIs into one notes tree.
pub struct Pipeline {
  /// Resolved directories and options
  settings:  Settings,
  /// Registry client
  client:    MetadataClient,
  /// PDF placement
  acquirer:  PdfAcquirer,
  /// Note placement
  organizer: Organizer,
}

impl Pipeline {
  /// Builds a pipeline from resolved settings.
  pub fn new(settings: Settings) -> Result<Self> {
    let client = MetadataClient::with_base_url(&settings.registry_url)?;
    let acquirer = PdfAcquirer::with_defaults(&settings.pdf_dir, settings.pdf_command.as_deref())?;
    let organizer = Organizer::new(&settings.markdown_dir, settings.folder_scheme);
    Ok(Self { settings, client, acquirer, organizer })
  }

  /// Replaces the PDF acquirer.
  pub fn with_acquirer(mut self, acquirer: PdfAcquirer) -> Self {
    self.acquirer = acquirer;
    self
  }

  /// The settings this pipeline runs with.
  pub fn settings(&self) -> &Settings { &self.settings }

  /// Imports one DOI.
  pub async fn run(&self, request: &Request) -> Result<Outcome> {
    let doi = &request.doi;

    info!("Fetching metadata for {doi}");
    let record = self.client.fetch(doi).await?;

    let kind = classify(&record, request.force_type);
    info!("Classified \"{}\" as {}", record.title, kind.label());

    let missing_fields = missing_fields(&record, kind);
    if !missing_fields.is_empty() {
      warn!("Record for {doi} is missing {}: {}", kind.label(), missing_fields.join(", "));
    }

    let template = Template::load(&self.settings.template_dir, kind)?;

    let pdf = self.acquirer.acquire(doi, &record, &request.pdf).await;

    let imported = Local::now().date_naive();
    let context = RenderContext { record: &record, kind, pdf_path: pdf.path(), imported };
    let note = template.render(&context);

    let note_path = self.organizer.write(&note, &record, imported)?;
    info!("Note written to {note_path:?}");

    Ok(Outcome { note_path, bibtex: note.bibtex, kind, pdf, missing_fields })
  }
}
