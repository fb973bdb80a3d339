/////////////////////////////////////////////////////////////////////////////////////////////
//
// Specifies kernel and cancel-distance options for configuring interpolation rebuilds.
//
// Created on: 20 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Specifies kernel and cancel-distance options for configuring interpolation rebuilds.
use cortical_interp_utils::{KernelParams, KernelType};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

/// The implemented weighting kernels for spreading sparse source
/// estimates across the mesh.
///
/// Each variant is a pure function of geodesic distance and cancel
/// distance, monotonically non-increasing in distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpolationFunction {
    Linear,
    Square,
    Cubic,
    Gaussian,
}

impl InterpolationFunction {
    /// Parses the GUI-facing kernel name ("Linear", "Square", "Cubic",
    /// "Gaussian") into its enum variant.
    pub fn from_name(name: &str) -> Option<InterpolationFunction> {
        match name {
            "Linear" => Some(InterpolationFunction::Linear),
            "Square" => Some(InterpolationFunction::Square),
            "Cubic" => Some(InterpolationFunction::Cubic),
            "Gaussian" => Some(InterpolationFunction::Gaussian),
            _ => None,
        }
    }

    /// Returns the GUI-facing kernel name.
    pub fn name(&self) -> &'static str {
        match self {
            InterpolationFunction::Linear => "Linear",
            InterpolationFunction::Square => "Square",
            InterpolationFunction::Cubic => "Cubic",
            InterpolationFunction::Gaussian => "Gaussian",
        }
    }
}

impl fmt::Display for InterpolationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<InterpolationFunction> for KernelType {
    fn from(v: InterpolationFunction) -> KernelType {
        match v {
            InterpolationFunction::Linear => KernelType::Linear,
            InterpolationFunction::Square => KernelType::Square,
            InterpolationFunction::Cubic => KernelType::Cubic,
            InterpolationFunction::Gaussian => KernelType::Gaussian,
        }
    }
}

#[doc = include_str!("../docs/interpolation_settings.md")]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InterpolationSettings {
    /// The weighting kernel to use for interpolation.
    pub interpolation_function: InterpolationFunction,

    /// Geodesic distance beyond which a source vertex may not influence
    /// a mesh vertex.
    pub cancel_distance: f64,
}

impl Default for InterpolationSettings {
    fn default() -> Self {
        InterpolationSettings {
            interpolation_function: InterpolationFunction::Cubic,
            cancel_distance: 0.05,
        }
    }
}

impl InterpolationSettings {
    /// Returns a new [`InterpolationSettingsBuilder`] for the given kernel.
    pub fn builder(interpolation_function: InterpolationFunction) -> InterpolationSettingsBuilder {
        InterpolationSettingsBuilder::new(interpolation_function)
    }
}

impl From<&InterpolationSettings> for KernelParams {
    /// Converts an [`InterpolationSettings`] instance into a
    /// [`cortical_interp_utils::KernelParams`].
    ///
    /// This allows `.into()` or `KernelParams::from(...)` to be used
    /// directly when passing settings into lower-level kernel functions.
    fn from(v: &InterpolationSettings) -> Self {
        KernelParams {
            kernel_type: v.interpolation_function.into(),
            cancel_distance: v.cancel_distance,
        }
    }
}

/// A convenience builder for constructing an [`InterpolationSettings`]
/// instance.
///
/// The builder should be called via the [`InterpolationSettings::builder`]
/// method.
#[derive(Debug, Clone, Copy)]
pub struct InterpolationSettingsBuilder {
    pub interpolation_function: InterpolationFunction,
    pub cancel_distance: f64,
}

impl InterpolationSettingsBuilder {
    /// Creates a new instance of the [`InterpolationSettingsBuilder`].
    fn new(interpolation_function: InterpolationFunction) -> Self {
        Self {
            interpolation_function,
            cancel_distance: InterpolationSettings::default().cancel_distance,
        }
    }

    /// Sets the cancel distance.
    pub fn cancel_distance(mut self, cancel_distance: f64) -> Self {
        self.cancel_distance = cancel_distance;
        self
    }

    /// Builds and returns an instance of [`InterpolationSettings`] from
    /// the values defined in the builder.
    pub fn build(self) -> InterpolationSettings {
        assert!(self.cancel_distance.is_finite());
        assert!(self.cancel_distance >= 0.0);
        InterpolationSettings {
            interpolation_function: self.interpolation_function,
            cancel_distance: self.cancel_distance,
        }
    }
}

/// Validates a user-supplied cancel distance at the update boundary.
pub(crate) fn validate_cancel_distance(value: f64) -> Result<(), ConfigError> {
    match value.is_finite() && value >= 0.0 {
        true => Ok(()),
        false => Err(ConfigError::InvalidCancelDistance { value }),
    }
}

/// Errors raised when a configuration update is rejected.
///
/// A rejected update leaves the previously accepted configuration (and
/// any already published operator) untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The supplied mesh has no vertices.
    EmptyMesh,

    /// The adjacency table does not have one neighbor list per vertex.
    NeighborCountMismatch { expected: usize, found: usize },

    /// A neighbor list references a vertex outside `[0, num_vertices)`.
    NeighborOutOfRange {
        vertex: usize,
        neighbor: usize,
        num_vertices: usize,
    },

    /// Vertex `vertex` lists `neighbor` but not the other way around.
    AsymmetricAdjacency { vertex: usize, neighbor: usize },

    /// A source-subset entry references a vertex outside `[0, num_vertices)`.
    SubsetIndexOutOfRange { index: usize, num_vertices: usize },

    /// A vertex appears more than once in the source subset.
    DuplicateSubsetIndex { index: usize },

    /// The cancel distance is negative or not finite.
    InvalidCancelDistance { value: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyMesh => {
                write!(f, "surface mesh has no vertices")
            }
            ConfigError::NeighborCountMismatch { expected, found } => {
                write!(
                    f,
                    "adjacency table has {} neighbor lists for {} vertices",
                    found, expected
                )
            }
            ConfigError::NeighborOutOfRange {
                vertex,
                neighbor,
                num_vertices,
            } => write!(
                f,
                "vertex {} lists neighbor {} outside [0, {})",
                vertex, neighbor, num_vertices
            ),
            ConfigError::AsymmetricAdjacency { vertex, neighbor } => write!(
                f,
                "vertex {} lists neighbor {} but the reverse edge is missing",
                vertex, neighbor
            ),
            ConfigError::SubsetIndexOutOfRange {
                index,
                num_vertices,
            } => write!(
                f,
                "source subset references vertex {} outside [0, {})",
                index, num_vertices
            ),
            ConfigError::DuplicateSubsetIndex { index } => {
                write!(f, "source subset lists vertex {} more than once", index)
            }
            ConfigError::InvalidCancelDistance { value } => {
                write!(f, "cancel distance {} is negative or not finite", value)
            }
        }
    }
}

impl Error for ConfigError {}
