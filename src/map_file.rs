// map_file.rs
//! Reading and writing the text map format:
//!
//! ```text
//! [Map]
//! author=Someone
//! warn=yes
//!
//! [Continents]
//! North America=5
//!
//! [Territories]
//! Alaska,North America,Northwest Territory,Alberta,Kamchatka
//! ```
//!
//! All territories are created before any adjacency is added, so a line may
//! name neighbours that are only declared further down.

use crate::board::GameMap;
use crate::error::GameError;
use std::fmt::Write as _;
use std::path::Path;
use thiserror::Error;

const DEFAULT_MAP: &str = include_str!("../maps/default.map");

#[derive(Debug, Error)]
pub enum MapFileError {
    #[error("cannot read or write map file: {0}")]
    Io(#[from] std::io::Error),

    #[error("map file has no [{0}] section")]
    MissingSection(&'static str),

    #[error("line {line}: unknown section [{name}]")]
    UnexpectedSection { line: usize, name: String },

    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("line {line}: '{value}' is not a positive control value")]
    BadNumber { line: usize, value: String },

    #[error("line {line}: {source}")]
    Graph {
        line: usize,
        #[source]
        source: GameError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Map,
    Continents,
    Territories,
}

impl Section {
    fn from_header(name: &str) -> Option<Self> {
        match name {
            "Map" => Some(Section::Map),
            "Continents" => Some(Section::Continents),
            "Territories" => Some(Section::Territories),
            _ => None,
        }
    }
}

fn graph_error(line: usize) -> impl Fn(GameError) -> MapFileError {
    move |source| MapFileError::Graph { line, source }
}

fn split_key_value(line: usize, text: &str) -> Result<(&str, &str), MapFileError> {
    text.split_once('=')
        .map(|(key, value)| (key.trim(), value.trim()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| MapFileError::Malformed {
            line,
            reason: format!("expected 'key=value', got '{text}'"),
        })
}

pub fn parse_map(text: &str) -> Result<GameMap, MapFileError> {
    let mut map = GameMap::new();
    let mut section = None;
    let mut seen = Vec::new();
    let mut territories: Vec<(usize, Vec<&str>)> = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let text = raw.trim();
        if text.is_empty() {
            continue;
        }

        if let Some(name) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            let next = Section::from_header(name.trim()).ok_or_else(|| {
                MapFileError::UnexpectedSection {
                    line,
                    name: name.to_string(),
                }
            })?;
            section = Some(next);
            seen.push(next);
            continue;
        }

        match section {
            None => {
                return Err(MapFileError::Malformed {
                    line,
                    reason: "content before the first section header".to_string(),
                })
            }
            Some(Section::Map) => {
                let (key, value) = split_key_value(line, text)?;
                match key {
                    "author" => map.metadata.author = Some(value.to_string()),
                    "warn" => map.metadata.warn = Some(value.to_string()),
                    _ => tracing::warn!(line, key, "ignoring unknown map setting"),
                }
            }
            Some(Section::Continents) => {
                let (name, value) = split_key_value(line, text)?;
                let control_value = value
                    .parse::<u32>()
                    .ok()
                    .filter(|v| *v > 0)
                    .ok_or_else(|| MapFileError::BadNumber {
                        line,
                        value: value.to_string(),
                    })?;
                map.add_continent(name, control_value)
                    .map_err(graph_error(line))?;
            }
            Some(Section::Territories) => {
                let fields: Vec<&str> = text.split(',').map(str::trim).collect();
                if fields.len() < 2 || fields[..2].iter().any(|f| f.is_empty()) {
                    return Err(MapFileError::Malformed {
                        line,
                        reason: format!("expected 'name,continent,neighbours...', got '{text}'"),
                    });
                }
                territories.push((line, fields));
            }
        }
    }

    for (required, name) in [
        (Section::Map, "Map"),
        (Section::Continents, "Continents"),
        (Section::Territories, "Territories"),
    ] {
        if !seen.contains(&required) {
            return Err(MapFileError::MissingSection(name));
        }
    }

    for (line, fields) in &territories {
        map.add_country(fields[0], fields[1])
            .map_err(graph_error(*line))?;
    }
    for (line, fields) in &territories {
        for neighbour in fields[2..].iter().filter(|n| !n.is_empty()) {
            map.set_adjacent(fields[0], neighbour)
                .map_err(graph_error(*line))?;
        }
    }

    tracing::debug!(
        continents = map.continents().count(),
        countries = map.country_count(),
        "map parsed"
    );
    Ok(map)
}

/// Renders `map` in the text format, names in sorted order.
pub fn write_map(map: &GameMap) -> String {
    let mut out = String::from("[Map]\n");
    if let Some(author) = &map.metadata.author {
        let _ = writeln!(out, "author={author}");
    }
    if let Some(warn) = &map.metadata.warn {
        let _ = writeln!(out, "warn={warn}");
    }

    out.push_str("\n[Continents]\n");
    for continent in map.continents() {
        let _ = writeln!(out, "{}={}", continent.name, continent.control_value);
    }

    out.push_str("\n[Territories]\n");
    for country in map.countries() {
        out.push_str(&country.name);
        out.push(',');
        out.push_str(&country.continent);
        for neighbour in country.adjacent_countries() {
            out.push(',');
            out.push_str(neighbour);
        }
        out.push('\n');
    }
    out
}

pub fn load_map(path: impl AsRef<Path>) -> Result<GameMap, MapFileError> {
    let text = std::fs::read_to_string(path)?;
    parse_map(&text)
}

pub fn save_map(map: &GameMap, path: impl AsRef<Path>) -> Result<(), MapFileError> {
    std::fs::write(path, write_map(map))?;
    Ok(())
}

/// The bundled 42-country world map.
pub fn default_map() -> Result<GameMap, MapFileError> {
    parse_map(DEFAULT_MAP)
}
