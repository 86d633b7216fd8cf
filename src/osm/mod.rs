// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Ingestion of [OpenStreetMap](https://www.openstreetmap.org/) data into a
//! [RoadNetwork]. Only ways carrying a drivable `highway` tag become roads;
//! buildings, footpaths, waterways and relations are ignored.

mod builder;
mod model;
mod xml;

use std::fs::File;
use std::io;
use std::path::Path;

use builder::NetworkBuilder;

use crate::RoadNetwork;

/// Format of the input OSM file
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Uncompressed [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    #[default]
    Xml,

    /// [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [gzip](https://en.wikipedia.org/wiki/Gzip) compression
    XmlGz,

    /// [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [bzip2](https://en.wikipedia.org/wiki/Bzip2) compression
    XmlBz2,
}

impl FileFormat {
    /// Guesses the format from a file name: `.gz` and `.bz2` suffixes select
    /// the matching compression, anything else is read as plain XML.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some("gz") => Self::XmlGz,
            Some("bz2") => Self::XmlBz2,
            _ => Self::Xml,
        }
    }
}

/// Additional controls for interpreting OSM data as a [RoadNetwork].
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Options {
    /// Format of the input data.
    pub file_format: FileFormat,

    /// Filter nodes by a specific bounding box. In order: left (min lon),
    /// bottom (min lat), right (max lon), top (max lat). Ignored if all
    /// values are set to zero, or at least one of them is not finite.
    pub bbox: [f64; 4],
}

/// Error conditions which may occur when ingesting OSM data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("xml: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The target network rejected an operation, e.g. because it has
    /// already been frozen.
    #[error(transparent)]
    Network(#[from] crate::NetworkError),
}

/// Parses OSM features from a reader into a [RoadNetwork] as per the
/// provided [Options].
///
/// The provided stream will be automatically wrapped in a buffered reader
/// when needed. The network must not be frozen yet; calling
/// [RoadNetwork::freeze] once all data is ingested remains the caller's
/// responsibility.
pub fn add_features_from_io<R: io::Read>(
    network: &mut RoadNetwork,
    options: &Options,
    reader: R,
) -> Result<(), Error> {
    match options.file_format {
        FileFormat::Xml => {
            let b = io::BufReader::new(reader);
            NetworkBuilder::new(network, options).add_features(xml::features_from_io(b))
        }

        FileFormat::XmlGz => {
            let d = flate2::read::MultiGzDecoder::new(reader);
            let b = io::BufReader::new(d);
            NetworkBuilder::new(network, options).add_features(xml::features_from_io(b))
        }

        FileFormat::XmlBz2 => {
            let d = bzip2::read::MultiBzDecoder::new(reader);
            let b = io::BufReader::new(d);
            NetworkBuilder::new(network, options).add_features(xml::features_from_io(b))
        }
    }
}

/// Parses OSM features from a file at the provided path into a
/// [RoadNetwork] as per the provided [Options].
pub fn add_features_from_file<P: AsRef<Path>>(
    network: &mut RoadNetwork,
    options: &Options,
    path: P,
) -> Result<(), Error> {
    let f = File::open(path)?;
    add_features_from_io(network, options, f)
}

/// Parses OSM features from a static buffer into a [RoadNetwork] as per
/// the provided [Options].
pub fn add_features_from_buffer(
    network: &mut RoadNetwork,
    options: &Options,
    data: &[u8],
) -> Result<(), Error> {
    if options.file_format == FileFormat::Xml {
        // Fast path is available for in-memory XML data
        NetworkBuilder::new(network, options).add_features(xml::features_from_buffer(data))
    } else {
        // Wrap the buffer in a cursor and use the IO path
        let cursor = io::Cursor::new(data);
        add_features_from_io(network, options, cursor)
    }
}
