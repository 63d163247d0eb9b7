//! Per-instance formula context

use std::fmt;

use serde::Serialize;

use super::FormulaError;
use crate::host::{BandAttributes, PartAttributes};

/// Value produced while evaluating a formula
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
    List(Vec<String>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Number(_) => "number",
            Self::List(_) => "list",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => f.write_str(&format_number(*number)),
            Self::List(items) => f.write_str(&items.join(", ")),
        }
    }
}

/// Print a number with at most six decimals and no trailing zeros
fn format_number(number: f64) -> String {
    let text = format!("{:.6}", number);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MaterialContext {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub url: String,
}

/// Edge band of one side
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EdgeContext {
    pub material_name: String,
    pub thickness: f64,
    pub width: f64,
}

/// Veneer of one face
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VeneerContext {
    pub material_name: String,
    pub thickness: f64,
}

impl From<Option<&BandAttributes>> for EdgeContext {
    fn from(band: Option<&BandAttributes>) -> Self {
        band.map_or_else(Self::default, |b| Self {
            material_name: b.material.clone(),
            thickness: f64::from(b.thickness),
            width: f64::from(b.width),
        })
    }
}

impl From<Option<&BandAttributes>> for VeneerContext {
    fn from(band: Option<&BandAttributes>) -> Self {
        band.map_or_else(Self::default, |b| Self {
            material_name: b.material.clone(),
            thickness: f64::from(b.thickness),
        })
    }
}

/// Everything a naming formula can read about one part instance
///
/// Lengths are millimeters and areas square meters, as computed by the
/// cutlist engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InstanceFormulaContext {
    /// Names of the enclosing containers, outermost first
    pub path: Vec<String>,
    pub instance_name: String,
    /// Display name of the instance
    pub name: String,
    pub definition_name: String,
    pub cutting_length: f64,
    pub cutting_width: f64,
    pub cutting_thickness: f64,
    pub edge_cutting_length: f64,
    pub edge_cutting_width: f64,
    pub bbox_length: f64,
    pub bbox_width: f64,
    pub bbox_thickness: f64,
    pub final_area: f64,
    pub material: MaterialContext,
    pub description: String,
    pub url: String,
    pub tags: Vec<String>,
    pub edge_ymin: EdgeContext,
    pub edge_ymax: EdgeContext,
    pub edge_xmin: EdgeContext,
    pub edge_xmax: EdgeContext,
    pub face_zmin: VeneerContext,
    pub face_zmax: VeneerContext,
    pub layer: String,
}

impl InstanceFormulaContext {
    /// Context holding the cutlist attributes of a part definition
    ///
    /// Instance-level fields (path, names, layer) are left empty.
    pub fn from_attributes(part: Option<&PartAttributes>) -> Self {
        let Some(part) = part else {
            return Self::default();
        };
        Self {
            cutting_length: f64::from(part.cutting_size.x),
            cutting_width: f64::from(part.cutting_size.y),
            cutting_thickness: f64::from(part.cutting_size.z),
            edge_cutting_length: f64::from(part.edge_cutting_length),
            edge_cutting_width: f64::from(part.edge_cutting_width),
            bbox_length: f64::from(part.size.x),
            bbox_width: f64::from(part.size.y),
            bbox_thickness: f64::from(part.size.z),
            final_area: f64::from(part.final_area),
            material: part
                .material
                .as_ref()
                .map(|m| MaterialContext {
                    name: m.name.clone(),
                    kind: m.kind.clone(),
                    description: m.description.clone(),
                    url: m.url.clone(),
                })
                .unwrap_or_default(),
            description: part.description.clone(),
            url: part.url.clone(),
            tags: part.tags.clone(),
            edge_ymin: part.edges.ymin.as_ref().into(),
            edge_ymax: part.edges.ymax.as_ref().into(),
            edge_xmin: part.edges.xmin.as_ref().into(),
            edge_xmax: part.edges.xmax.as_ref().into(),
            face_zmin: part.veneers.zmin.as_ref().into(),
            face_zmax: part.veneers.zmax.as_ref().into(),
            ..Self::default()
        }
    }

    /// Read a field by dotted path (`bbox_length`, `material.name`, ...)
    pub fn lookup(&self, field: &str) -> Result<Value, FormulaError> {
        let text = |s: &String| -> Result<Value, FormulaError> { Ok(Value::Text(s.clone())) };
        let number = |n: f64| -> Result<Value, FormulaError> { Ok(Value::Number(n)) };

        match field.split('.').collect::<Vec<_>>().as_slice() {
            ["path"] => Ok(Value::List(self.path.clone())),
            ["instance_name"] => text(&self.instance_name),
            ["name"] => text(&self.name),
            ["definition_name"] => text(&self.definition_name),
            ["cutting_length"] => number(self.cutting_length),
            ["cutting_width"] => number(self.cutting_width),
            ["cutting_thickness"] => number(self.cutting_thickness),
            ["edge_cutting_length"] => number(self.edge_cutting_length),
            ["edge_cutting_width"] => number(self.edge_cutting_width),
            ["bbox_length"] => number(self.bbox_length),
            ["bbox_width"] => number(self.bbox_width),
            ["bbox_thickness"] => number(self.bbox_thickness),
            ["final_area"] => number(self.final_area),
            ["material"] | ["material", "name"] | ["material_name"] => text(&self.material.name),
            ["material", "type"] | ["material_type"] => text(&self.material.kind),
            ["material", "description"] | ["material_description"] => {
                text(&self.material.description)
            }
            ["material", "url"] | ["material_url"] => text(&self.material.url),
            ["description"] => text(&self.description),
            ["url"] => text(&self.url),
            ["tags"] => Ok(Value::List(self.tags.clone())),
            ["layer"] => text(&self.layer),
            [side, rest @ ..] if side.starts_with("edge_") => {
                let edge = match *side {
                    "edge_ymin" => &self.edge_ymin,
                    "edge_ymax" => &self.edge_ymax,
                    "edge_xmin" => &self.edge_xmin,
                    "edge_xmax" => &self.edge_xmax,
                    _ => return Err(FormulaError::UnknownField(field.to_string())),
                };
                match rest {
                    [] | ["material_name"] => text(&edge.material_name),
                    ["thickness"] => number(edge.thickness),
                    ["width"] => number(edge.width),
                    _ => Err(FormulaError::UnknownField(field.to_string())),
                }
            }
            [face, rest @ ..] if face.starts_with("face_") => {
                let veneer = match *face {
                    "face_zmin" => &self.face_zmin,
                    "face_zmax" => &self.face_zmax,
                    _ => return Err(FormulaError::UnknownField(field.to_string())),
                };
                match rest {
                    [] | ["material_name"] => text(&veneer.material_name),
                    ["thickness"] => number(veneer.thickness),
                    _ => Err(FormulaError::UnknownField(field.to_string())),
                }
            }
            _ => Err(FormulaError::UnknownField(field.to_string())),
        }
    }
}
