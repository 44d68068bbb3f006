use std::{
    borrow::Cow,
    fmt::Write as _,
    io::{self, Write},
};

use serde::Serialize;
use tabwriter::TabWriter;

use crate::{Dataset, Status, session::Snapshot};

pub const TABLE_ID: &str = "viewing-activity-table";

/// Escapes `& < > " '` so the result is inert as HTML text or attribute value.
pub fn html_escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Display projection of one page: a column per header field and a row per
/// record, every value as literal text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Grid {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Grid {
    pub fn from_page(dataset: &Dataset, page: &[usize]) -> Self {
        Grid {
            headers: dataset.headers().to_vec(),
            rows: page
                .iter()
                .filter_map(|&i| dataset.record(i))
                .map(|r| r.values().to_vec())
                .collect(),
        }
    }
}

/// Builds HTML for the dashboard. The header row only changes with the
/// dataset, so it is built once per upload generation.
#[derive(Debug, Default)]
pub struct Renderer {
    header: Option<(u64, String)>,
    header_builds: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops the cached header row.
    pub fn invalidate(&mut self) {
        self.header = None;
    }

    pub fn header_html(&mut self, generation: u64, headers: &[String]) -> &str {
        if self.header.as_ref().is_none_or(|(g, _)| *g != generation) {
            let mut html = String::from("<thead><tr>");
            for h in headers {
                let _ = write!(html, "<th>{}</th>", html_escape(h));
            }
            html.push_str("</tr></thead>");
            self.header_builds += 1;
            self.header = Some((generation, html));
        }
        self.header.as_ref().map_or("", |(_, html)| html.as_str())
    }

    pub fn table_html(&mut self, generation: u64, grid: &Grid) -> String {
        let mut html = format!("<table id=\"{TABLE_ID}\">");
        html.push_str(self.header_html(generation, &grid.headers));
        html.push_str("<tbody>");
        for row in &grid.rows {
            html.push_str("<tr>");
            for value in row {
                let _ = write!(html, "<td>{}</td>", html_escape(value));
            }
            html.push_str("</tr>");
        }
        html.push_str("</tbody></table>");
        html
    }

    /// A standalone page with the status, summary, pagination and table.
    pub fn dashboard_html(&mut self, generation: u64, snapshot: &Snapshot) -> String {
        let mut html = String::from(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>Viewing History</title>\n</head>\n<body>\n",
        );

        match &snapshot.status {
            Some(Status::Error(msg)) => {
                let _ = writeln!(html, "<p class=\"error\">{}</p>", html_escape(msg));
            },
            Some(Status::Success(msg)) => {
                let _ = writeln!(html, "<p class=\"success\">{}</p>", html_escape(msg));
            },
            None => {},
        }

        let profile = if snapshot.profile.is_empty() {
            crate::filter::ALL_PROFILES
        } else {
            &snapshot.profile
        };
        let _ = writeln!(
            html,
            "<dl class=\"summary\"><dt>Records</dt><dd>{}</dd><dt>Dates</dt><dd>{}</dd>\
             <dt>Profile</dt><dd>{}</dd></dl>",
            snapshot.summary.count,
            html_escape(&snapshot.date_range),
            html_escape(profile),
        );
        let _ = writeln!(
            html,
            "<p class=\"download\">{}</p>",
            html_escape(&snapshot.download_label)
        );
        html.push_str(&self.table_html(generation, &snapshot.grid));
        let _ = writeln!(
            html,
            "\n<p class=\"page-info\">{}</p>",
            html_escape(&snapshot.page_label)
        );
        html.push_str("</body>\n</html>\n");
        html
    }
}

/// Makes a value safe to print on a terminal. Tabs and line breaks become
/// spaces; other C0 controls and DEL print in caret notation (ESC is `^[`);
/// C1 controls become spaces.
pub fn terminal_safe(s: &str) -> Cow<'_, str> {
    if !s.chars().any(char::is_control) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '\t' | '\r' | '\n' => out.push(' '),
            '\x7f' => out.push_str("^?"),
            c if (c as u32) < 0x20 => {
                out.push('^');
                out.push(char::from(b'@' + c as u8));
            },
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Tab-aligned plain text, one line per record. Values go through
/// [`terminal_safe`].
pub fn write_text_table<W: Write>(wtr: W, grid: &Grid) -> io::Result<()> {
    let mut tw = TabWriter::new(wtr);
    write_text_row(&mut tw, &grid.headers)?;
    for row in &grid.rows {
        write_text_row(&mut tw, row)?;
    }
    tw.flush()
}

fn write_text_row<W: Write>(wtr: &mut W, values: &[String]) -> io::Result<()> {
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            wtr.write_all(b"\t")?;
        }
        wtr.write_all(terminal_safe(value).as_bytes())?;
    }
    wtr.write_all(b"\n")
}
