//! services/ppt_service.rs
//! Relleno de la plantilla PowerPoint: etiquetas de fecha `{{Date}}`,
//! placeholders numéricos `{{a12}}` y barras de porcentaje `bar_aa3`.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use regex::{Captures, Regex};

use crate::models::report_model::TableSet;
use crate::services::ooxml::package::OoxmlPackage;
use crate::services::ooxml::xml::{XmlDocument, XmlElement, XmlNode};
use crate::utils::fiscal::date_labels;
use crate::utils::format::format_value;

const GREEN: &str = "63C384";
const RED: &str = "FF0000";

/// Hijos de `spPr` que definen el relleno (se sustituyen por un sólido)
const FILL_ELEMENTS: &[&str] = &[
    "noFill", "solidFill", "gradFill", "blipFill", "pattFill", "grpFill",
];

/// Resumen de lo que se modificó en la presentación
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillStats {
    pub slides: usize,
    pub date_tags_replaced: usize,
    pub placeholders_replaced: usize,
    pub bars_found: usize,
    pub bars_updated: usize,
    pub bars_removed: usize,
}

/// Forma de barra encontrada antes de editar (geometría original)
#[derive(Debug, Clone, PartialEq)]
struct BarShape {
    name: String,
    prefix: String,
    number: usize,
    original_left: Option<i64>,
    original_width: Option<i64>,
}

enum BarOutcome {
    Updated,
    Remove,
    Skipped,
}

pub struct TemplateFiller<'a> {
    tables: &'a TableSet,
    labels: Vec<(&'static str, String)>,
    placeholder_re: Regex,
    bar_re: Regex,
    slide_re: Regex,
}

impl<'a> TemplateFiller<'a> {
    pub fn new(tables: &'a TableSet, today: NaiveDate) -> Result<Self> {
        Ok(Self {
            tables,
            labels: date_labels(today),
            placeholder_re: Regex::new(r"\{\{([A-Za-z]{1,2})(\d+)\}\}")?,
            bar_re: Regex::new(r"^bar_([A-Za-z]{1,2})(\d+)$")?,
            slide_re: Regex::new(r"^ppt/slides/slide(\d+)\.xml$")?,
        })
    }

    /// Aplica todas las sustituciones a las diapositivas del paquete.
    pub fn fill(&self, package: &mut OoxmlPackage) -> Result<FillStats> {
        let mut stats = FillStats::default();

        let mut slides: Vec<(u32, String)> = package
            .part_names()
            .filter_map(|name| {
                let caps = self.slide_re.captures(name)?;
                let n = caps[1].parse::<u32>().ok()?;
                Some((n, name.to_string()))
            })
            .collect();
        slides.sort();

        log::info!("Recogiendo geometría original de las barras de porcentaje...");
        for (index, part) in &slides {
            let mut doc = package.xml(part)?;
            self.fill_slide(&mut doc, *index, &mut stats);
            package.set_xml(part, &doc);
            stats.slides += 1;
        }

        if stats.bars_found == 0 {
            log::warn!(
                "La presentación no tiene formas con nombre 'bar_XXYY'."
            );
        }

        Ok(stats)
    }

    fn fill_slide(&self, doc: &mut XmlDocument, slide_index: u32, stats: &mut FillStats) {
        // 1) barras con su geometría original, antes de tocar nada
        let mut bars = Vec::new();
        self.collect_bars(&doc.root, slide_index, &mut bars);
        stats.bars_found += bars.len();

        // 2) etiquetas de fecha (por párrafo) y 3) placeholders numéricos (por run)
        for_each_paragraph(&mut doc.root, &mut |p: &mut XmlElement| {
            if self.replace_date_tags(p) {
                stats.date_tags_replaced += 1;
            }
            stats.placeholders_replaced += self.replace_placeholders(p);
        });

        // 4) barras
        if !bars.is_empty() {
            self.update_bars(&mut doc.root, &bars, stats);
        }
    }

    fn collect_bars(&self, container: &XmlElement, slide_index: u32, out: &mut Vec<BarShape>) {
        for child in container.elements() {
            match child.local_name() {
                "sp" | "cxnSp" | "pic" => {
                    if let Some(bar) = self.bar_shape(child) {
                        out.push(bar);
                    }
                }
                "graphicFrame" => {
                    if let Some(bar) = self.bar_shape(child) {
                        log::warn!(
                            "  La forma '{}' de la diapositiva {} tiene nombre de barra pero es una tabla. Se omite.",
                            bar.name,
                            slide_index
                        );
                    }
                }
                "grpSp" => {
                    if let Some(bar) = self.bar_shape(child) {
                        log::warn!(
                            "  La forma '{}' de la diapositiva {} tiene nombre de barra pero es un grupo. Se omite.",
                            bar.name,
                            slide_index
                        );
                    }
                    self.collect_bars(child, slide_index, out);
                }
                _ => self.collect_bars(child, slide_index, out),
            }
        }
    }

    fn bar_shape(&self, shape: &XmlElement) -> Option<BarShape> {
        let name = shape_name(shape)?;
        let caps = self.bar_re.captures(name)?;
        let (left, width) = geometry(shape);
        Some(BarShape {
            name: name.to_string(),
            prefix: caps[1].to_string(),
            number: caps[2].parse().ok()?,
            original_left: left,
            original_width: width,
        })
    }

    /// Une el texto de los runs del párrafo y reemplaza `{{Clave}}`.
    /// Si cambia, el primer run recibe todo el texto y el resto queda vacío.
    fn replace_date_tags(&self, paragraph: &mut XmlElement) -> bool {
        let full_text: String = paragraph
            .children_named("r")
            .map(|r| r.child("t").map(|t| t.text()).unwrap_or_default())
            .collect();

        if !full_text.contains("{{") {
            return false;
        }

        let mut new_text = full_text.clone();
        for (key, value) in &self.labels {
            let tag = format!("{{{{{}}}}}", key);
            if new_text.contains(&tag) {
                new_text = new_text.replace(&tag, value);
            }
        }

        if new_text == full_text {
            return false;
        }

        let prefix = ns_prefix(&paragraph.name).to_string();
        let runs = paragraph.elements_mut().filter(|e| e.is("r"));

        for (i, run) in runs.enumerate() {
            let text = if i == 0 { new_text.clone() } else { String::new() };
            match run.child_mut("t") {
                Some(t) => t.set_text(text),
                None => run
                    .children
                    .push(XmlNode::Element(XmlElement::new(qualified(&prefix, "t")).with_text(text))),
            }
        }

        true
    }

    /// Reemplaza `{{<prefijo><n>}}` dentro de cada run. Devuelve cuántos.
    fn replace_placeholders(&self, paragraph: &mut XmlElement) -> usize {
        let mut replaced = 0;

        for run in paragraph.elements_mut().filter(|e| e.is("r")) {
            let Some(t) = run.child_mut("t") else {
                continue;
            };
            let original = t.text();
            if !original.contains("{{") {
                continue;
            }

            let updated = self
                .placeholder_re
                .replace_all(&original, |caps: &Captures| {
                    let prefix = &caps[1];
                    let value = caps[2]
                        .parse::<usize>()
                        .ok()
                        .and_then(|n| self.tables.lookup(prefix, n));
                    match value {
                        Some(value) => {
                            replaced += 1;
                            format_value(prefix, value).0
                        }
                        None => caps[0].to_string(),
                    }
                })
                .into_owned();

            if updated != original {
                t.set_text(updated);
            }
        }

        replaced
    }

    fn update_bars(&self, container: &mut XmlElement, bars: &[BarShape], stats: &mut FillStats) {
        let mut to_remove = Vec::new();

        for (i, node) in container.children.iter_mut().enumerate() {
            let XmlNode::Element(child) = node else {
                continue;
            };

            match child.local_name() {
                "sp" | "cxnSp" | "pic" => {
                    let Some(bar) = shape_name(child).and_then(|n| bars.iter().find(|b| b.name == n))
                    else {
                        continue;
                    };
                    match self.apply_bar(child, bar) {
                        BarOutcome::Updated => stats.bars_updated += 1,
                        BarOutcome::Remove => to_remove.push(i),
                        BarOutcome::Skipped => {}
                    }
                }
                "graphicFrame" => {}
                _ => self.update_bars(child, bars, stats),
            }
        }

        stats.bars_removed += to_remove.len();
        for i in to_remove.into_iter().rev() {
            container.children.remove(i);
        }
    }

    fn apply_bar(&self, shape: &mut XmlElement, bar: &BarShape) -> BarOutcome {
        let Some(table) = self.tables.table_for(&bar.prefix) else {
            log::warn!(
                "    Sin tabla para la forma {}. No se actualiza.",
                bar.name
            );
            return BarOutcome::Skipped;
        };
        let Some(value) = table.cell(bar.number) else {
            log::warn!(
                "    Celda {} fuera de rango en la tabla {} para la forma {}. No se actualiza.",
                bar.number,
                bar.prefix,
                bar.name
            );
            return BarOutcome::Skipped;
        };
        let Some(raw) = value.as_number() else {
            log::warn!(
                "    Valor no numérico '{:?}' para la forma {}. No se actualiza.",
                value,
                bar.name
            );
            return BarOutcome::Skipped;
        };

        let fraction = raw.abs().clamp(0.0, 1.0);
        if fraction == 0.0 {
            return BarOutcome::Remove;
        }

        let (Some(original_left), Some(original_width)) = (bar.original_left, bar.original_width)
        else {
            log::warn!(
                "    La forma {} no tiene posición/tamaño explícitos. No se actualiza.",
                bar.name
            );
            return BarOutcome::Skipped;
        };

        let (width, color) = if fraction >= 1.0 {
            (original_width, GREEN)
        } else {
            let width = (original_width as f64 * fraction).round_ties_even() as i64;
            (width, if raw > 0.0 { GREEN } else { RED })
        };

        let Some(sp_pr) = shape.child_mut("spPr") else {
            return BarOutcome::Skipped;
        };
        if let Some(off) = sp_pr.path_mut(&["xfrm", "off"]) {
            off.set_attr("x", original_left.to_string());
        }
        if let Some(ext) = sp_pr.path_mut(&["xfrm", "ext"]) {
            ext.set_attr("cx", width.to_string());
        }
        set_solid_fill(sp_pr, color);

        BarOutcome::Updated
    }
}

/// Abre la plantilla, la rellena y guarda el resultado en `output`.
pub fn update_ppt(
    template: &Path,
    output: &Path,
    tables: &TableSet,
    today: NaiveDate,
) -> Result<FillStats> {
    let mut package = OoxmlPackage::open(template)
        .with_context(|| format!("No se pudo abrir la plantilla {:?}", template))?;

    let stats = TemplateFiller::new(tables, today)?.fill(&mut package)?;
    package.save(output)?;

    log::info!("PowerPoint actualizado guardado en {:?}", output);
    Ok(stats)
}

fn for_each_paragraph(el: &mut XmlElement, f: &mut dyn FnMut(&mut XmlElement)) {
    for child in el.elements_mut() {
        if child.is("p") {
            f(child);
        } else {
            for_each_paragraph(child, f);
        }
    }
}

/// Nombre de la forma (`p:nvSpPr/p:cNvPr/@name` o equivalente).
fn shape_name(shape: &XmlElement) -> Option<&str> {
    shape
        .elements()
        .find(|e| e.local_name().starts_with("nv"))
        .and_then(|nv| nv.child("cNvPr"))
        .and_then(|c| c.attr("name"))
}

fn geometry(shape: &XmlElement) -> (Option<i64>, Option<i64>) {
    let xfrm = shape.path(&["spPr", "xfrm"]);
    let left = xfrm
        .and_then(|x| x.child("off"))
        .and_then(|off| off.attr("x"))
        .and_then(|x| x.parse().ok());
    let width = xfrm
        .and_then(|x| x.child("ext"))
        .and_then(|ext| ext.attr("cx"))
        .and_then(|cx| cx.parse().ok());
    (left, width)
}

fn set_solid_fill(sp_pr: &mut XmlElement, color: &str) {
    sp_pr.remove_elements(|e| FILL_ELEMENTS.contains(&e.local_name()));

    let fill = XmlElement::new("a:solidFill")
        .with_child(XmlElement::new("a:srgbClr").with_attr("val", color));

    // Orden del esquema: xfrm, geometría, relleno, línea...
    let position = sp_pr
        .children
        .iter()
        .rposition(|n| {
            matches!(n, XmlNode::Element(e) if matches!(e.local_name(), "xfrm" | "prstGeom" | "custGeom"))
        })
        .map(|i| i + 1)
        .unwrap_or(0);
    sp_pr.children.insert(position, XmlNode::Element(fill));
}

fn ns_prefix(name: &str) -> &str {
    name.split_once(':').map(|(p, _)| p).unwrap_or("")
}

fn qualified(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_string()
    } else {
        format!("{}:{}", prefix, local)
    }
}
