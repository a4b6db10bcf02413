//! Diagnostic report rendering and patient-detail validation.

use crate::decision::DiagnosisResult;
use crate::error::{Error, Result};
use printpdf::{BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 10.0;

/// Patient details collected for the report form.
#[derive(Debug, Clone)]
pub struct PatientDetails {
    pub name: String,
    /// Age in years, 1-120.
    pub age: u8,
    /// Mobile number, exactly 10 digits.
    pub mobile: String,
    pub address: String,
}

impl PatientDetails {
    /// Validate all fields, naming the first offending one.
    ///
    /// Must pass before any report is rendered; a failure leaves the
    /// analysis itself untouched.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation {
                field: "name",
                reason: "patient name is required".to_string(),
            });
        }
        if !(1..=120).contains(&self.age) {
            return Err(Error::Validation {
                field: "age",
                reason: "patient age must be between 1 and 120".to_string(),
            });
        }
        if self.mobile.len() != 10 || !self.mobile.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::Validation {
                field: "mobile",
                reason: "mobile number must be exactly 10 digits".to_string(),
            });
        }
        if self.address.trim().is_empty() {
            return Err(Error::Validation {
                field: "address",
                reason: "patient address is required".to_string(),
            });
        }
        Ok(())
    }

    /// Default report filename derived from the patient name.
    pub fn default_report_filename(&self) -> String {
        format!(
            "{}_diagnostic_report.pdf",
            self.name.trim().replace(' ', "_")
        )
    }
}

fn pdf_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Report(e.to_string())
}

/// Render the diagnostic report PDF to `output`.
///
/// Validates the patient details first; rendering is plain templated text
/// layout on a single A4 page.
pub fn render_report(
    patient: &PatientDetails,
    diagnosis: &DiagnosisResult,
    output: &Path,
) -> Result<()> {
    patient.validate()?;

    let (doc, page, layer) = PdfDocument::new(
        "Breast Cancer Diagnostic Report",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "report",
    );
    let layer = doc.get_page(page).get_layer(layer);

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_err)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_err)?;
    let italic = doc
        .add_builtin_font(BuiltinFont::HelveticaOblique)
        .map_err(pdf_err)?;

    let mut y = PAGE_HEIGHT_MM - 20.0;
    layer.use_text(
        "Breast Cancer Diagnostic Report",
        16.0,
        Mm(55.0),
        Mm(y),
        &bold,
    );
    y -= 8.0;
    layer.use_text(
        "Generated by AI Diagnostic System",
        12.0,
        Mm(70.0),
        Mm(y),
        &regular,
    );
    y -= 8.0;

    layer.set_outline_thickness(0.5);
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(MARGIN_MM), Mm(y)), false),
            (Point::new(Mm(PAGE_WIDTH_MM - MARGIN_MM), Mm(y)), false),
        ],
        is_closed: false,
    });
    y -= 10.0;

    let date = chrono::Local::now().format("%B %d, %Y");
    layer.use_text(format!("Date: {date}"), 12.0, Mm(MARGIN_MM), Mm(y), &regular);
    y -= 12.0;

    layer.use_text("Patient Information:", 12.0, Mm(MARGIN_MM), Mm(y), &bold);
    y -= 8.0;
    for line in [
        format!("Name: {}", patient.name),
        format!("Age: {}", patient.age),
        format!("Mobile No: {}", patient.mobile),
    ] {
        layer.use_text(line, 12.0, Mm(MARGIN_MM), Mm(y), &regular);
        y -= 8.0;
    }
    y = write_wrapped(
        &layer,
        &regular,
        &format!("Address: {}", patient.address),
        12.0,
        y,
    );
    y -= 6.0;

    layer.use_text("Diagnosis Result:", 12.0, Mm(MARGIN_MM), Mm(y), &bold);
    y -= 8.0;
    layer.use_text(
        format!(
            "Prediction: {} (Confidence: {:.2}%)",
            diagnosis.label, diagnosis.confidence
        ),
        12.0,
        Mm(MARGIN_MM),
        Mm(y),
        &regular,
    );
    y -= 16.0;

    y = write_wrapped(
        &layer,
        &italic,
        "This report is generated based on AI analysis and is not a substitute \
         for professional medical advice.",
        10.0,
        y,
    );
    y -= 16.0;

    layer.use_text(
        "Doctor Signature: ____________________",
        12.0,
        Mm(MARGIN_MM),
        Mm(y),
        &regular,
    );

    let file = File::create(output)?;
    doc.save(&mut BufWriter::new(file)).map_err(pdf_err)?;
    Ok(())
}

/// Write text as one or more lines, wrapping on whitespace.
/// Returns the y position below the written block.
fn write_wrapped(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    text: &str,
    size: f32,
    mut y: f32,
) -> f32 {
    const MAX_CHARS: usize = 95;

    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.len() + word.len() + 1 > MAX_CHARS {
            layer.use_text(line.clone(), size, Mm(MARGIN_MM), Mm(y), font);
            y -= 6.0;
            line.clear();
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        layer.use_text(line, size, Mm(MARGIN_MM), Mm(y), font);
        y -= 6.0;
    }
    y
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::decide;
    use ndarray::Array4;

    fn patient() -> PatientDetails {
        PatientDetails {
            name: "Jane Roe".to_string(),
            age: 44,
            mobile: "1234567890".to_string(),
            address: "12 Main St, Springfield".to_string(),
        }
    }

    #[test]
    fn valid_details_pass() {
        assert!(patient().validate().is_ok());
    }

    #[test]
    fn empty_name_is_rejected_regardless_of_other_fields() {
        let mut p = patient();
        p.name = "   ".to_string();
        let err = p.validate().unwrap_err();
        assert!(matches!(err, Error::Validation { field: "name", .. }));
    }

    #[test]
    fn short_mobile_is_rejected() {
        let mut p = patient();
        p.mobile = "12345".to_string();
        let err = p.validate().unwrap_err();
        assert!(matches!(err, Error::Validation { field: "mobile", .. }));
    }

    #[test]
    fn non_numeric_mobile_is_rejected() {
        let mut p = patient();
        p.mobile = "12345abcde".to_string();
        let err = p.validate().unwrap_err();
        assert!(matches!(err, Error::Validation { field: "mobile", .. }));
    }

    #[test]
    fn ten_digit_mobile_is_accepted() {
        let mut p = patient();
        p.mobile = "1234567890".to_string();
        assert!(p.validate().is_ok());
    }

    #[test]
    fn empty_address_is_rejected() {
        let mut p = patient();
        p.address = String::new();
        let err = p.validate().unwrap_err();
        assert!(matches!(err, Error::Validation { field: "address", .. }));
    }

    #[test]
    fn zero_age_is_rejected() {
        let mut p = patient();
        p.age = 0;
        let err = p.validate().unwrap_err();
        assert!(matches!(err, Error::Validation { field: "age", .. }));
    }

    #[test]
    fn default_filename_uses_underscores() {
        assert_eq!(
            patient().default_report_filename(),
            "Jane_Roe_diagnostic_report.pdf"
        );
    }

    #[test]
    fn report_renders_a_pdf_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let output = temp_dir.path().join("report.pdf");

        let refined = Array4::zeros((1, 1, 256, 256));
        let diagnosis = decide(&refined, &[0.0, 5.0, 0.0]);
        render_report(&patient(), &diagnosis, &output).unwrap();

        let bytes = std::fs::read(&output).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn report_rejects_invalid_details_without_writing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let output = temp_dir.path().join("report.pdf");

        let refined = Array4::zeros((1, 1, 256, 256));
        let diagnosis = decide(&refined, &[5.0, 0.0, 0.0]);

        let mut p = patient();
        p.mobile = "12345".to_string();
        assert!(render_report(&p, &diagnosis, &output).is_err());
        assert!(!output.exists());
    }
}
