use super::{Confidence, RawUsage, Receiver, UsageEdge, UsageGraph};
use crate::config::ExtractionConfig;
use crate::discovery::{FileType, SourceFile};
use crate::extract::{DeclarativeExtractor, ImperativeExtractor};
use crate::parser::ast::{Descriptor, DescriptorKind, MethodBody};
use crate::parser::xml::XmlParser;
use crate::parser::{ParseError, PythonParser};
use crate::registry::{ModelRegistry, ModelDecl};
use std::path::Path;
use tracing::debug;

/// Builder for constructing the usage graph.
///
/// Files are processed in two phases behind one API: declarations accumulate
/// into the registry while method bodies and descriptors are parked, and
/// `build` replays the parked artifacts through the extractors once the
/// registry is complete. References can therefore resolve against models
/// declared in files processed later.
pub struct GraphBuilder {
    registry: ModelRegistry,
    python_parser: PythonParser,
    xml_parser: XmlParser,
    bodies: Vec<MethodBody>,
    descriptors: Vec<Descriptor>,
    extraction: ExtractionConfig,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::with_config(ExtractionConfig::default())
    }

    pub fn with_config(extraction: ExtractionConfig) -> Self {
        Self {
            registry: ModelRegistry::new(),
            python_parser: PythonParser::new(),
            xml_parser: XmlParser::new(),
            bodies: Vec::new(),
            descriptors: Vec::new(),
            extraction,
        }
    }

    /// Process a source file, accumulating declarations and reference sites
    pub fn process_file(&mut self, file: &SourceFile) -> Result<(), ParseError> {
        let contents = file.read_contents()?;
        match file.file_type {
            FileType::Python => self.process_python_source(&file.path, &contents),
            FileType::Xml => self.process_xml_source(&file.path, &contents),
            // Manifests are consumed during discovery
            FileType::Manifest => Ok(()),
        }
    }

    pub fn process_python_source(
        &mut self,
        path: &Path,
        contents: &str,
    ) -> Result<(), ParseError> {
        debug!("Parsing Python file: {}", path.display());
        let result = self.python_parser.parse(path, contents)?;
        for model in result.models {
            self.register(model);
        }
        self.bodies.extend(result.bodies);
        Ok(())
    }

    pub fn process_xml_source(&mut self, path: &Path, contents: &str) -> Result<(), ParseError> {
        debug!("Parsing XML file: {}", path.display());
        let descriptors = self.xml_parser.parse(path, contents)?;
        self.descriptors.extend(descriptors);
        Ok(())
    }

    /// Register a model declaration directly (used by tests and callers that
    /// already hold parsed declarations)
    pub fn register(&mut self, model: ModelDecl) {
        self.registry.register(model);
    }

    /// Finish the registry, run extraction, and resolve every reference
    pub fn build(mut self) -> (ModelRegistry, UsageGraph) {
        let mut raw = self.registry.finalize();

        let imperative = ImperativeExtractor::new(&self.registry);
        for body in &self.bodies {
            raw.extend(imperative.extract_body(body));
        }

        let declarative = DeclarativeExtractor::new(&self.registry)
            .scan_expressions(self.extraction.view_expressions);
        for descriptor in &self.descriptors {
            if !self.extraction.automation_code
                && matches!(
                    descriptor.kind,
                    DescriptorKind::ServerAction | DescriptorKind::Cron
                )
            {
                continue;
            }
            raw.extend(declarative.extract(descriptor, &mut self.python_parser));
        }

        debug!("Resolving {} raw references", raw.len());
        let mut graph = UsageGraph::new();
        for usage in raw {
            resolve_usage(&self.registry, usage, &mut graph);
        }

        (self.registry, graph)
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve one raw reference into usage edges.
///
/// Known receivers resolve through the receiver model's inheritance and
/// delegation closure; unknown receivers fan out to every declaration of the
/// name anywhere, each match an independent low-confidence edge. References
/// matching nothing are kept as dangling diagnostics.
pub(crate) fn resolve_usage(registry: &ModelRegistry, usage: RawUsage, graph: &mut UsageGraph) {
    let namespace = usage.kind.target_kind();
    match &usage.receiver {
        Receiver::Known(model) => match registry.resolve(model, &usage.target, namespace) {
            Some(symbol) => graph.add_edge(UsageEdge {
                symbol,
                kind: usage.kind,
                confidence: usage.confidence,
                location: usage.location,
            }),
            None => graph.add_dangling(usage),
        },
        Receiver::Unknown => {
            let candidates = registry.candidates(&usage.target, namespace);
            if candidates.is_empty() {
                graph.add_dangling(usage);
                return;
            }
            for symbol in candidates {
                graph.add_edge(UsageEdge {
                    symbol,
                    kind: usage.kind,
                    confidence: Confidence::Low,
                    location: usage.location.clone(),
                });
            }
        }
    }
}
