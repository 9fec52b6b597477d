//! Update task types

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pixel position on the artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Circle marker target: a center and a point on the edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    pub center: Point,
    pub edge: Point,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid locator '{0}', expected \"cx,cy ex,ey\"")]
pub struct LocatorParseError(String);

impl Locator {
    pub fn new(cx: i32, cy: i32, ex: i32, ey: i32) -> Self {
        Self {
            center: Point { x: cx, y: cy },
            edge: Point { x: ex, y: ey },
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{} {},{}",
            self.center.x, self.center.y, self.edge.x, self.edge.y
        )
    }
}

impl FromStr for Locator {
    type Err = LocatorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || LocatorParseError(s.to_string());
        let mut points = s.split_whitespace().map(|pair| -> Result<Point, LocatorParseError> {
            let (x, y) = pair.split_once(',').ok_or_else(err)?;
            Ok(Point {
                x: x.trim().parse().map_err(|_| err())?,
                y: y.trim().parse().map_err(|_| err())?,
            })
        });

        let center = points.next().ok_or_else(err)??;
        let edge = points.next().ok_or_else(err)??;
        if points.next().is_some() {
            return Err(err());
        }
        Ok(Self { center, edge })
    }
}

/// One mutation of the shared artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum UpdateTask {
    /// Mark `target` with `attribute` (a colour) on the current artifact
    Draw { target: Locator, attribute: String },

    /// Make the staged file at `source` the current artifact
    Replace { source: PathBuf },
}

impl UpdateTask {
    pub fn draw(target: Locator, attribute: impl Into<String>) -> Self {
        UpdateTask::Draw {
            target,
            attribute: attribute.into(),
        }
    }

    pub fn replace(source: impl Into<PathBuf>) -> Self {
        UpdateTask::Replace { source: source.into() }
    }

    /// Short name of the variant, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            UpdateTask::Draw { .. } => "draw",
            UpdateTask::Replace { .. } => "replace",
        }
    }
}
