// src/notify/render.rs
//! Subject, HTML and plain-text bodies for the new-listings email.

use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write as _;

use super::Digest;

pub fn subject(d: &Digest) -> String {
    format!(
        "[Business Alert] {} New Listing(s) Found – {}",
        d.total(),
        d.ts.format("%Y-%m-%d")
    )
}

pub fn plain_text(d: &Digest) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "New Business Listings Alert");
    let _ = writeln!(
        out,
        "Run time: {} | {} new matching listing(s) found",
        d.ts.format("%Y-%m-%d %H:%M UTC"),
        d.total()
    );
    for (source, items) in &d.groups {
        let _ = writeln!(out, "\n{source} — {} new listing(s)", items.len());
        for l in items {
            let _ = writeln!(out, "  - {}\n    {}", l.title, l.url);
        }
    }
    let _ = writeln!(out, "\nKeywords: {}", d.keywords.join(", "));
    let _ = writeln!(out, "Sources: {}", d.sources.join(" • "));
    out
}

pub fn html(d: &Digest) -> String {
    let mut sections = String::new();
    for (source, items) in &d.groups {
        let mut rows = String::new();
        for l in items {
            let href = encode_double_quoted_attribute(&l.url);
            let _ = write!(
                rows,
                r#"
            <tr>
              <td style="padding:10px 12px; border-bottom:1px solid #e5e7eb;">
                <a href="{href}" style="color:#1d4ed8; text-decoration:none; font-weight:600;">{title}</a>
              </td>
              <td style="padding:10px 12px; border-bottom:1px solid #e5e7eb; color:#6b7280; font-size:13px;">
                <a href="{href}" style="color:#6b7280; word-break:break-all;">{url}</a>
              </td>
            </tr>"#,
                title = encode_text(&l.title),
                url = encode_text(&l.url),
            );
        }
        let _ = write!(
            sections,
            r#"
        <h2 style="font-family:Arial,sans-serif; font-size:16px; color:#374151; margin:24px 0 8px; border-left:4px solid #3b82f6; padding-left:10px;">
          {source} &mdash; {count} new listing(s)
        </h2>
        <table style="width:100%; border-collapse:collapse; background:#fff; border:1px solid #e5e7eb;">
          <thead>
            <tr style="background:#f3f4f6;">
              <th style="padding:10px 12px; text-align:left; font-size:13px; color:#374151; width:45%;">Business Name</th>
              <th style="padding:10px 12px; text-align:left; font-size:13px; color:#374151;">Link</th>
            </tr>
          </thead>
          <tbody>{rows}
          </tbody>
        </table>"#,
            source = encode_text(source),
            count = items.len(),
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"></head>
<body style="font-family:Arial,sans-serif; background:#f9fafb; padding:20px; color:#111827;">
  <div style="max-width:800px; margin:0 auto; background:#fff; border-radius:8px; padding:30px;">
    <h1 style="font-size:20px; color:#111827; margin:0 0 4px;">New Business Listings Alert</h1>
    <p style="color:#6b7280; font-size:14px; margin:0 0 20px;">
      Run time: {run_time} &nbsp;|&nbsp; {total} new matching listing(s) found
    </p>
    <hr style="border:none; border-top:1px solid #e5e7eb; margin:0 0 20px;">
    {sections}
    <hr style="border:none; border-top:1px solid #e5e7eb; margin:24px 0 16px;">
    <p style="font-size:12px; color:#9ca3af; margin:0;">
      Keywords: {keywords}<br>
      Sources: {sources}
    </p>
  </div>
</body>
</html>"#,
        run_time = d.ts.format("%Y-%m-%d %H:%M UTC"),
        total = d.total(),
        keywords = encode_text(&d.keywords.join(", ")),
        sources = d
            .sources
            .iter()
            .map(|s| encode_text(s).into_owned())
            .collect::<Vec<_>>()
            .join(" &bull; "),
    )
}
