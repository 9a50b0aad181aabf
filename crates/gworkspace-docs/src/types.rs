//! Docs v1 wire types.
//!
//! Only the parts of the document tree that text-location resolution reads
//! are modelled; everything else in a response is ignored.

use serde::{Deserialize, Serialize};

/// A fetched (or newly created) document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub document_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Body,
    pub revision_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Body {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

/// A node of the body. The API omits `startIndex` when it is zero.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralElement {
    #[serde(default)]
    pub start_index: i64,
    #[serde(default)]
    pub end_index: i64,
    pub paragraph: Option<Paragraph>,
    pub table: Option<Table>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub elements: Vec<ParagraphElement>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphElement {
    #[serde(default)]
    pub start_index: i64,
    #[serde(default)]
    pub end_index: i64,
    pub text_run: Option<TextRun>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextRun {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(default)]
    pub rows: i64,
    #[serde(default)]
    pub columns: i64,
    #[serde(default)]
    pub table_rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    #[serde(default)]
    pub start_index: i64,
    #[serde(default)]
    pub end_index: i64,
    #[serde(default)]
    pub table_cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    #[serde(default)]
    pub start_index: i64,
    #[serde(default)]
    pub end_index: i64,
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

/// Body of `documents.batchUpdate`.
#[derive(Debug, Serialize)]
pub struct BatchUpdateRequest {
    pub requests: Vec<Request>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateResponse {
    #[serde(default)]
    pub document_id: String,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub replace_all_text: Option<ReplaceAllTextReply>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceAllTextReply {
    #[serde(default)]
    pub occurrences_changed: i64,
}

/// One edit inside a batch update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    InsertText(InsertTextRequest),
    ReplaceAllText(ReplaceAllTextRequest),
    InsertTable(InsertTableRequest),
    UpdateTextStyle(UpdateTextStyleRequest),
    UpdateTableCellStyle(UpdateTableCellStyleRequest),
}

impl Request {
    pub fn insert_text(text: impl Into<String>, index: i64) -> Self {
        Self::InsertText(InsertTextRequest {
            text: text.into(),
            location: Location { index },
        })
    }

    /// Case-sensitive replacement of every occurrence.
    pub fn replace_all_text(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self::ReplaceAllText(ReplaceAllTextRequest {
            contains_text: SubstringMatchCriteria {
                text: old.into(),
                match_case: true,
            },
            replace_text: new.into(),
        })
    }

    pub fn insert_table(rows: i64, columns: i64, index: i64) -> Self {
        Self::InsertTable(InsertTableRequest {
            rows,
            columns,
            location: Location { index },
        })
    }

    /// Turn `[start, end)` into a hyperlink.
    pub fn link_range(start_index: i64, end_index: i64, url: impl Into<String>) -> Self {
        Self::UpdateTextStyle(UpdateTextStyleRequest {
            range: Range {
                start_index,
                end_index,
            },
            text_style: TextStyle {
                link: Some(Link { url: url.into() }),
            },
            fields: "link".to_string(),
        })
    }

    /// Background colour of a single cell.
    pub fn cell_background(
        table_start: i64,
        row_index: i64,
        column_index: i64,
        color: OptionalColor,
    ) -> Self {
        Self::UpdateTableCellStyle(UpdateTableCellStyleRequest {
            table_cell_style: TableCellStyle {
                background_color: Some(color),
            },
            fields: "backgroundColor".to_string(),
            table_range: TableRange {
                table_cell_location: TableCellLocation {
                    table_start_location: Location { index: table_start },
                    row_index,
                    column_index,
                },
                row_span: 1,
                column_span: 1,
            },
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    pub index: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Range {
    pub start_index: i64,
    pub end_index: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertTextRequest {
    pub text: String,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstringMatchCriteria {
    pub text: String,
    pub match_case: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceAllTextRequest {
    pub contains_text: SubstringMatchCriteria,
    pub replace_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertTableRequest {
    pub rows: i64,
    pub columns: i64,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTextStyleRequest {
    pub range: Range,
    pub text_style: TextStyle,
    pub fields: String,
}

/// RGB components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RgbColor {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl RgbColor {
    pub const RED: Self = Self::new(1.0, 0.0, 0.0);

    pub const fn new(red: f32, green: f32, blue: f32) -> Self {
        Self { red, green, blue }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Color {
    pub rgb_color: RgbColor,
}

/// A colour that may be absent (absent means transparent).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OptionalColor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl From<RgbColor> for OptionalColor {
    fn from(rgb_color: RgbColor) -> Self {
        Self {
            color: Some(Color { rgb_color }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCellStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<OptionalColor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCellLocation {
    pub table_start_location: Location,
    pub row_index: i64,
    pub column_index: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRange {
    pub table_cell_location: TableCellLocation,
    pub row_span: i64,
    pub column_span: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTableCellStyleRequest {
    pub table_cell_style: TableCellStyle,
    pub fields: String,
    pub table_range: TableRange,
}
