//! Form document pipeline
//!
//! A form starts as a spreadsheet and becomes XForm XML through
//! [`convert`]; input that is already XML skips that step. The XML is then
//! bound to a deployment with [`super::rewrite_bindings`].

use super::converter::XlsFormConverter;
use super::rewrite::{required_media, rewrite_bindings, RewriteReport};
use crate::domain::{
    FormError, FormValidity, GeodataCategory, RelayError, Result, XFormId,
};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// An XForm written to disk, bound to its deployment
#[derive(Debug, Clone)]
pub struct UpdatedXForm {
    pub path: PathBuf,
    pub form_id: XFormId,
    pub report: RewriteReport,
}

/// Convert a spreadsheet form and return the XForm text
///
/// # Errors
///
/// - `FormError::ConversionFailed` if the converter fails
/// - `FormError::EmptyOutput` if it produced nothing at `output`
pub async fn convert(
    converter: &dyn XlsFormConverter,
    source: &Path,
    output: &Path,
    validate: bool,
) -> Result<String> {
    converter
        .convert(source, output, validate)
        .await
        .map_err(|e| FormError::ConversionFailed {
            message: format!("Couldn't convert {} to an XForm!", source.display()),
            cause: e.to_string(),
        })?;

    let xml = match tokio::fs::read_to_string(output).await {
        Ok(xml) => xml,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    if xml.is_empty() {
        return Err(FormError::EmptyOutput(output.display().to_string()).into());
    }

    Ok(xml)
}

/// Produce the deployment-bound XForm at `xform_path`
///
/// `extension` is the input's form type (`xls`, `xlsx`, `xml`, with or
/// without a leading dot). The form id is the file stem of `xform_path`.
pub async fn generate_updated_xform(
    converter: &dyn XlsFormConverter,
    input: &Path,
    xform_path: &Path,
    extension: &str,
    category: &GeodataCategory,
) -> Result<UpdatedXForm> {
    let form_id = XFormId::from_path(xform_path).map_err(RelayError::Validation)?;
    let extension = extension.trim_start_matches('.').to_ascii_lowercase();

    if let Some(parent) = xform_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let xml = if extension == "xml" {
        tokio::fs::read_to_string(input).await?
    } else {
        convert(converter, input, xform_path, false).await?
    };

    let report = rewrite_bindings(&xml, &form_id, category)?;
    tokio::fs::write(xform_path, &report.xml).await?;

    tracing::info!(
        form_id = %form_id,
        category = %category,
        path = %xform_path.display(),
        changes = report.change_count(),
        skipped = report.skipped().count(),
        "Generated deployment XForm"
    );

    Ok(UpdatedXForm {
        path: xform_path.to_path_buf(),
        form_id,
        report,
    })
}

/// Check an uploaded form and list the geodata it needs
///
/// # Errors
///
/// `FormError::Invalid` carrying the underlying reason.
pub async fn check_validity(
    converter: &dyn XlsFormConverter,
    content: &[u8],
    form_type: &str,
) -> Result<FormValidity> {
    let extension = form_type.trim_start_matches('.').to_ascii_lowercase();
    if extension.is_empty() || extension.contains(['/', '\\']) {
        return Err(RelayError::Validation(format!("Invalid form type: {form_type}")));
    }

    let scratch = tempfile::tempdir()?;
    let source = scratch.path().join(format!("upload.{extension}"));
    let output = scratch.path().join("upload-check.xml");
    tokio::fs::write(&source, content).await?;

    let xml = if extension == "xml" {
        String::from_utf8(content.to_vec()).map_err(|e| FormError::Invalid(e.to_string()))?
    } else {
        convert(converter, &source, &output, true)
            .await
            .map_err(|e| invalid(&e))?
    };

    let media = required_media(&xml).map_err(|e| invalid(&e))?;
    tracing::debug!(required_media = ?media, "Form is valid");

    Ok(FormValidity::valid(media))
}

fn invalid(err: &RelayError) -> RelayError {
    let reason = match err {
        RelayError::Form(FormError::ConversionFailed { cause, .. }) => cause.clone(),
        RelayError::Form(FormError::InvalidXml(detail)) => detail.clone(),
        other => other.to_string(),
    };
    FormError::Invalid(reason).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Writes a fixed document, or fails
    struct FixedConverter(Option<&'static str>);

    #[async_trait]
    impl XlsFormConverter for FixedConverter {
        async fn convert(&self, _source: &Path, output: &Path, _validate: bool) -> Result<()> {
            match self.0 {
                Some(xml) => Ok(tokio::fs::write(output, xml).await?),
                None => Err(RelayError::Conversion("sheet 'survey' not found".to_string())),
            }
        }
    }

    const XML: &str = r#"<h:html xmlns="http://www.w3.org/2002/xforms" xmlns:h="http://www.w3.org/1999/xhtml"><h:head><model><instance><data id="survey"/></instance><instance id="roads" src="jr://file/roads.geojson"/></model></h:head></h:html>"#;

    #[tokio::test]
    async fn test_convert_failure_message() {
        let dir = tempfile::tempdir().unwrap();
        let err = convert(
            &FixedConverter(None),
            Path::new("survey.xlsx"),
            &dir.path().join("out.xml"),
            false,
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Form error: Couldn't convert survey.xlsx to an XForm!");
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_convert_empty_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.xml");
        let err = convert(&FixedConverter(Some("")), Path::new("a.xls"), &output, false)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Form(FormError::EmptyOutput(_))));
    }

    #[tokio::test]
    async fn test_generate_updated_xform_from_spreadsheet() {
        let dir = tempfile::tempdir().unwrap();
        let xform_path = dir.path().join("form-42.xml");
        let updated = generate_updated_xform(
            &FixedConverter(Some(XML)),
            Path::new("survey.xlsx"),
            &xform_path,
            ".xlsx",
            &GeodataCategory::new("buildings").unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(updated.form_id.as_str(), "form-42");
        let written = std::fs::read_to_string(&xform_path).unwrap();
        assert!(written.contains(r#"<data id="form-42"/>"#));
        assert!(written.contains(r#"src="jr://file/buildings.geojson""#));
    }

    #[tokio::test]
    async fn test_generate_updated_xform_reads_xml_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("upload.xml");
        std::fs::write(&input, XML).unwrap();
        let xform_path = dir.path().join("roads.xml");

        // the converter must not run for XML input
        let updated = generate_updated_xform(
            &FixedConverter(None),
            &input,
            &xform_path,
            "xml",
            &GeodataCategory::new("roads").unwrap(),
        )
        .await
        .unwrap();
        assert!(updated.report.xml.contains(r#"<data id="roads"/>"#));
    }

    #[tokio::test]
    async fn test_check_validity_lists_media() {
        let validity = check_validity(&FixedConverter(Some(XML)), b"xlsx bytes", ".xlsx")
            .await
            .unwrap();
        assert_eq!(validity.required_media, vec!["roads".to_string()]);
        assert_eq!(validity.message, "Your form is valid");
    }

    #[tokio::test]
    async fn test_check_validity_reports_reason() {
        let err = check_validity(&FixedConverter(None), b"junk", "xls")
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Form error: Your form is invalid: Conversion error: sheet 'survey' not found"
        );
    }
}
