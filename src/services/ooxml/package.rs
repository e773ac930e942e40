//! services/ooxml/package.rs
//! Paquete OOXML (zip) cargado en memoria: lectura, reemplazo y escritura de partes.

use std::{
    fs,
    io::{Cursor, Read, Write},
    path::Path,
};

use anyhow::{anyhow, Context, Result};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipArchive, ZipWriter};

use super::xml::XmlDocument;

#[derive(Debug, Clone, Default)]
pub struct OoxmlPackage {
    /// Partes en el orden original del zip
    parts: Vec<(String, Vec<u8>)>,
}

impl OoxmlPackage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("No se pudo leer {:?}", path))?;
        Self::from_bytes(bytes).with_context(|| format!("{:?} no es un paquete OOXML válido", path))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).context("Zip inválido")?;
        let mut parts = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .with_context(|| format!("Entrada {} ilegible en el zip", i))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)
                .with_context(|| format!("Error descomprimiendo {}", name))?;
            parts.push((name, data));
        }

        Ok(Self { parts })
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(name, _)| name.as_str())
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.parts.iter().any(|(n, _)| n == name)
    }

    pub fn part(&self, name: &str) -> Result<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
            .ok_or_else(|| anyhow!("Parte '{}' no encontrada en el paquete", name))
    }

    pub fn xml(&self, name: &str) -> Result<XmlDocument> {
        XmlDocument::parse(self.part(name)?).with_context(|| format!("Error parseando {}", name))
    }

    /// Reemplaza la parte si existe, si no la añade al final.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = data,
            None => self.parts.push((name.to_string(), data)),
        }
    }

    pub fn set_xml(&mut self, name: &str, doc: &XmlDocument) {
        self.set_part(name, doc.to_bytes());
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, data) in &self.parts {
            writer
                .start_file(name.as_str(), options)
                .with_context(|| format!("Error creando entrada {}", name))?;
            writer
                .write_all(data)
                .with_context(|| format!("Error escribiendo entrada {}", name))?;
        }

        let cursor = writer.finish().context("Error cerrando el zip")?;
        Ok(cursor.into_inner())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes).with_context(|| format!("No se pudo escribir {:?}", path))
    }
}
