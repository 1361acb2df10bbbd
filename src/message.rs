//! Parsing raw messages and extracting PDF attachment candidates.
//!
//! A candidate is a leaf MIME part that carries a `Content-Disposition`
//! header (any value - presence of the header is the attachment marker) and a
//! filename ending in `.pdf`, case-insensitively. Multipart containers are
//! descended, never extracted. Payloads are transfer-decoded to raw bytes.

use crate::error::{Error, Result};
use mailparse::{parse_mail, MailHeaderMap, ParsedMail};

/// One PDF attachment extracted from a message, payload already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfAttachment {
    /// Filename as declared by the sender. Not trusted as a path; the spool
    /// sanitizes it before writing.
    pub filename: String,
    /// Decoded payload bytes.
    pub data: Vec<u8>,
}

/// A message reduced to what the orchestrator needs: envelope headers for
/// logging plus the PDF candidates.
#[derive(Debug, Clone)]
pub struct ParsedEmail {
    /// Sender header, if present.
    pub sender: Option<String>,
    /// Subject header, if present.
    pub subject: Option<String>,
    /// PDF attachment candidates in part order.
    pub pdf_attachments: Vec<PdfAttachment>,
}

/// Parses raw RFC 822 bytes and collects the PDF attachment candidates.
///
/// # Errors
///
/// Returns an error if the message cannot be parsed at all, or if a
/// candidate's payload fails to transfer-decode. Either way the caller skips
/// this message and moves on to the next one.
pub fn parse_email(raw: &[u8]) -> Result<ParsedEmail> {
    let parsed = parse_mail(raw).map_err(|source| Error::ParseMail { source })?;

    let sender = parsed.headers.get_first_value("From");
    let subject = parsed.headers.get_first_value("Subject");

    let mut pdf_attachments = Vec::new();
    collect_pdfs(&parsed, &mut pdf_attachments)?;

    Ok(ParsedEmail {
        sender,
        subject,
        pdf_attachments,
    })
}

/// Depth-first walk over the part tree.
///
/// A single-part message is its own one leaf; the root is not special.
fn collect_pdfs(part: &ParsedMail<'_>, out: &mut Vec<PdfAttachment>) -> Result<()> {
    if !part.subparts.is_empty() {
        for sub in &part.subparts {
            collect_pdfs(sub, out)?;
        }
        return Ok(());
    }

    // A multipart with no subparts is malformed; nothing to extract
    if part.ctype.mimetype.to_lowercase().starts_with("multipart/") {
        return Ok(());
    }

    // The disposition header itself marks the part as an attachment; inline
    // body parts don't carry one
    if part
        .headers
        .get_first_value("Content-Disposition")
        .is_none()
    {
        return Ok(());
    }

    let Some(filename) = part_filename(part) else {
        return Ok(());
    };

    if !is_pdf_filename(&filename) {
        return Ok(());
    }

    let data = part
        .get_body_raw()
        .map_err(|source| Error::DecodeAttachment {
            filename: filename.clone(),
            source,
        })?;

    out.push(PdfAttachment { filename, data });
    Ok(())
}

/// Resolves a part's filename from the disposition `filename` parameter,
/// falling back to the Content-Type `name` parameter.
fn part_filename(part: &ParsedMail<'_>) -> Option<String> {
    let disposition = part.get_content_disposition();
    disposition
        .params
        .get("filename")
        .or_else(|| part.ctype.params.get("name"))
        .map(String::to_owned)
        .filter(|name| !name.is_empty())
}

/// Returns `true` if the filename ends with the `.pdf` suffix,
/// case-insensitively.
#[must_use]
pub fn is_pdf_filename(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.ends_with(".pdf")
}
