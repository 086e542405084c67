// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR text line recognition
//!
//! Runs the PP-OCR recognition network over one text line at a time and
//! decodes its per-timestep class scores with greedy CTC.

use anyhow::{anyhow, bail, Context, Result};
use ndarray::{Array4, ArrayView2, ArrayViewD, Axis, Ix2};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::preprocessing::REC_INPUT_HEIGHT;

/// Class index reserved for the CTC blank
const BLANK: usize = 0;

/// Recognized line with confidence
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedText {
    pub text: String,
    /// Mean confidence over emitted characters (0.0-1.0)
    pub confidence: f32,
    pub char_confidences: Vec<f32>,
}

impl RecognizedText {
    pub fn new(text: String, confidence: f32) -> Self {
        Self {
            text,
            confidence,
            char_confidences: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Class index to character table of a recognition model
#[derive(Debug, Clone, PartialEq)]
pub struct CharDictionary {
    chars: Vec<char>,
}

impl CharDictionary {
    /// Build from key-file lines; blank lines are skipped
    ///
    /// The blank class is placed at index 0 and a space class appended when
    /// the keys do not already contain one.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut chars = vec![' '];
        chars.extend(lines.into_iter().filter_map(|line| line.chars().next()));
        if !chars[BLANK + 1..].contains(&' ') {
            chars.push(' ');
        }
        Self { chars }
    }

    /// Read a PaddleOCR key file, one character per line
    pub fn from_file(path: &Path) -> Result<Self> {
        let keys = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dictionary {}", path.display()))?;
        Ok(Self::from_lines(keys.lines()))
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.len() <= 1
    }

    /// Character for a non-blank class
    pub fn get(&self, class: usize) -> Option<char> {
        if class == BLANK {
            None
        } else {
            self.chars.get(class).copied()
        }
    }
}

/// PaddleOCR recognition model (CPU)
#[derive(Clone)]
pub struct OcrRecognitionModel {
    session: Arc<Mutex<Session>>,
    dictionary: Arc<CharDictionary>,
    input_name: String,
}

impl std::fmt::Debug for OcrRecognitionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrRecognitionModel")
            .field("classes", &self.dictionary.len())
            .field("input_name", &self.input_name)
            .finish_non_exhaustive()
    }
}

impl OcrRecognitionModel {
    /// Load the ONNX model and its character dictionary
    ///
    /// # Errors
    /// Fails if either file is missing or ONNX Runtime cannot build a session.
    pub fn new(model_path: &Path, dict_path: &Path) -> Result<Self> {
        for (what, path) in [("model", model_path), ("character dictionary", dict_path)] {
            if !path.exists() {
                bail!("OCR recognition {} not found: {}", what, path.display());
            }
        }

        let dictionary = CharDictionary::from_file(dict_path)?;
        info!(
            "Loading OCR recognition model from {} ({} classes)",
            model_path.display(),
            dictionary.len()
        );

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(2)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .with_context(|| format!("Failed to load {}", model_path.display()))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "x".to_string());

        info!("✅ OCR recognition model ready (input '{}')", input_name);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            dictionary: Arc::new(dictionary),
            input_name,
        })
    }

    pub fn dictionary(&self) -> &CharDictionary {
        &self.dictionary
    }

    /// Recognize one preprocessed line tensor of shape [1, 3, 48, W]
    pub fn recognize(&self, input: &Array4<f32>) -> Result<RecognizedText> {
        match input.shape() {
            [1, 3, h, w] if *h == REC_INPUT_HEIGHT as usize && *w >= 4 => {}
            shape => bail!(
                "Invalid line tensor {:?}, expected [1, 3, {}, W>=4]",
                shape,
                REC_INPUT_HEIGHT
            ),
        }

        let tensor = Value::from_array(input.to_owned()).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("OCR recognition session lock poisoned"))?;
        let outputs = session
            .run(ort::inputs![&self.input_name => tensor])
            .context("Recognition inference failed")?;
        let scores = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract recognition scores")?;

        debug!("Recognition scores shape {:?}", scores.shape());

        ctc_greedy_decode(&self.dictionary, timestep_scores(scores.view())?)
    }
}

/// View recognition output as `[timesteps, classes]`
///
/// Batched `[1, T, C]` output is reduced to its first item.
pub fn timestep_scores<'a>(output: ArrayViewD<'a, f32>) -> Result<ArrayView2<'a, f32>> {
    let output = match output.ndim() {
        3 => output.index_axis_move(Axis(0), 0),
        2 => output,
        _ => bail!("Unexpected recognition output shape {:?}", output.shape()),
    };
    output
        .into_dimensionality::<Ix2>()
        .context("Recognition output is not two-dimensional")
}

/// Best-path CTC decoding: argmax per timestep, collapse repeats, drop blanks
pub fn ctc_greedy_decode(
    dictionary: &CharDictionary,
    scores: ArrayView2<'_, f32>,
) -> Result<RecognizedText> {
    let mut text = String::new();
    let mut char_confidences = Vec::new();
    let mut previous = BLANK;

    for row in scores.axis_iter(Axis(0)) {
        let (class, score) = row
            .iter()
            .copied()
            .enumerate()
            .fold((BLANK, f32::NEG_INFINITY), |best, (i, s)| {
                if s > best.1 {
                    (i, s)
                } else {
                    best
                }
            });

        if class != previous {
            if let Some(ch) = dictionary.get(class) {
                text.push(ch);
                char_confidences.push(score);
            }
        }
        previous = class;
    }

    let confidence = match char_confidences.len() {
        0 => 0.0,
        n => {
            let mean = char_confidences.iter().sum::<f32>() / n as f32;
            // log-probability outputs
            if mean < 0.0 {
                1.0 / (1.0 + (-mean).exp())
            } else {
                mean.min(1.0)
            }
        }
    };

    Ok(RecognizedText {
        text: text.trim().to_string(),
        confidence,
        char_confidences,
    })
}
