// Parallel graph builder using rayon

use super::builder::resolve_usage;
use super::{RawUsage, UsageGraph};
use crate::config::ExtractionConfig;
use crate::discovery::{FileType, SourceFile};
use crate::extract::{DeclarativeExtractor, ImperativeExtractor};
use crate::parser::ast::{Descriptor, DescriptorKind, MethodBody};
use crate::parser::xml::XmlParser;
use crate::parser::{ParseError, PythonParser};
use crate::registry::{ModelDecl, ModelRegistry};
use miette::Result;
use rayon::prelude::*;
use tracing::{debug, info};

/// Parsed file result
#[derive(Default)]
struct ParsedFile {
    models: Vec<ModelDecl>,
    bodies: Vec<MethodBody>,
    descriptors: Vec<Descriptor>,
}

/// Parallel graph builder for faster processing.
///
/// Parsing and extraction parallelize per file and per body; registration and
/// resolution stay sequential, so the resulting graph is identical to the
/// sequential builder's regardless of thread scheduling.
pub struct ParallelGraphBuilder {
    extraction: ExtractionConfig,
}

impl ParallelGraphBuilder {
    pub fn new() -> Self {
        Self::with_config(ExtractionConfig::default())
    }

    pub fn with_config(extraction: ExtractionConfig) -> Self {
        Self { extraction }
    }

    /// Build registry and usage graph from source files in parallel
    pub fn build_from_files(&self, files: &[SourceFile]) -> Result<(ModelRegistry, UsageGraph)> {
        info!("Parsing {} files in parallel...", files.len());

        let results: Vec<std::result::Result<ParsedFile, ParseError>> = files
            .par_iter()
            .map_init(
                || (PythonParser::new(), XmlParser::new()),
                |(python, xml), file| Self::parse_file(python, xml, file),
            )
            .collect();

        let mut registry = ModelRegistry::new();
        let mut bodies = Vec::new();
        let mut descriptors = Vec::new();
        for result in results {
            match result {
                Ok(parsed) => {
                    for model in parsed.models {
                        registry.register(model);
                    }
                    bodies.extend(parsed.bodies);
                    descriptors.extend(parsed.descriptors);
                }
                Err(e) => {
                    debug!("Parse error (continuing): {e}");
                }
            }
        }

        info!(
            "Registered {} models, {} method bodies, {} descriptors",
            registry.model_count(),
            bodies.len(),
            descriptors.len()
        );

        let mut raw = registry.finalize();

        let imperative = ImperativeExtractor::new(&registry);
        let body_usages: Vec<RawUsage> = bodies
            .par_iter()
            .flat_map_iter(|body| imperative.extract_body(body))
            .collect();
        raw.extend(body_usages);

        let declarative =
            DeclarativeExtractor::new(&registry).scan_expressions(self.extraction.view_expressions);
        let automation_code = self.extraction.automation_code;
        let descriptor_usages: Vec<RawUsage> = descriptors
            .par_iter()
            .map_init(PythonParser::new, |parser, descriptor| {
                if !automation_code
                    && matches!(
                        descriptor.kind,
                        DescriptorKind::ServerAction | DescriptorKind::Cron
                    )
                {
                    return Vec::new();
                }
                declarative.extract(descriptor, parser)
            })
            .flatten_iter()
            .collect();
        raw.extend(descriptor_usages);

        info!("Resolving {} references...", raw.len());
        let mut graph = UsageGraph::new();
        for usage in raw {
            resolve_usage(&registry, usage, &mut graph);
        }

        Ok((registry, graph))
    }

    /// Parse a single file
    fn parse_file(
        python: &mut PythonParser,
        xml: &XmlParser,
        file: &SourceFile,
    ) -> std::result::Result<ParsedFile, ParseError> {
        let contents = file.read_contents()?;
        match file.file_type {
            FileType::Python => {
                let result = python.parse(&file.path, &contents)?;
                Ok(ParsedFile {
                    models: result.models,
                    bodies: result.bodies,
                    descriptors: Vec::new(),
                })
            }
            FileType::Xml => {
                let descriptors = xml.parse(&file.path, &contents)?;
                Ok(ParsedFile {
                    descriptors,
                    ..ParsedFile::default()
                })
            }
            FileType::Manifest => Ok(ParsedFile::default()),
        }
    }
}

impl Default for ParallelGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
