//! Model identifier resolution.

use fastembed::{EmbeddingModel, TextEmbedding};

use super::EmbeddingError;

/// Model used when neither the request nor the configuration names one.
pub const DEFAULT_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Hub-style names accepted in addition to fastembed's own model codes.
const ALIASES: &[(&str, EmbeddingModel)] = &[
    ("sentence-transformers/all-MiniLM-L6-v2", EmbeddingModel::AllMiniLML6V2),
    ("sentence-transformers/all-MiniLM-L12-v2", EmbeddingModel::AllMiniLML12V2),
    ("BAAI/bge-small-en-v1.5", EmbeddingModel::BGESmallENV15),
    ("BAAI/bge-base-en-v1.5", EmbeddingModel::BGEBaseENV15),
    ("BAAI/bge-large-en-v1.5", EmbeddingModel::BGELargeENV15),
    ("intfloat/multilingual-e5-small", EmbeddingModel::MultilingualE5Small),
    ("intfloat/multilingual-e5-base", EmbeddingModel::MultilingualE5Base),
    ("nomic-ai/nomic-embed-text-v1.5", EmbeddingModel::NomicEmbedTextV15),
];

/// A model identifier mapped onto a fastembed model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModelName {
    /// fastembed model to load.
    pub model: EmbeddingModel,
    /// Identifier reported back to callers and used as the cache key.
    pub name: String,
}

/// Resolve a model identifier.
///
/// Accepts (case-insensitively) a hub-style alias, a fastembed model code such as
/// `Qdrant/all-MiniLM-L6-v2-onnx`, or a fastembed variant name such as
/// `AllMiniLML6V2`.
pub fn resolve_model(name: &str) -> Result<ResolvedModelName, EmbeddingError> {
    let wanted = name.trim();
    if wanted.is_empty() {
        return Err(EmbeddingError::UnknownModel(name.to_string()));
    }

    if let Some((alias, model)) = ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(wanted))
    {
        return Ok(ResolvedModelName {
            model: model.clone(),
            name: (*alias).to_string(),
        });
    }

    TextEmbedding::list_supported_models()
        .into_iter()
        .find(|info| {
            info.model_code.eq_ignore_ascii_case(wanted)
                || format!("{:?}", info.model).eq_ignore_ascii_case(wanted)
        })
        .map(|info| {
            // Report the hub-style name when one exists so every spelling shares a cache key
            let name = ALIASES
                .iter()
                .find(|(_, model)| *model == info.model)
                .map(|(alias, _)| (*alias).to_string())
                .unwrap_or(info.model_code);
            ResolvedModelName {
                model: info.model,
                name,
            }
        })
        .ok_or_else(|| EmbeddingError::UnknownModel(wanted.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model_resolves() {
        let resolved = resolve_model(DEFAULT_MODEL).unwrap();
        assert_eq!(resolved.model, EmbeddingModel::AllMiniLML6V2);
        assert_eq!(resolved.name, DEFAULT_MODEL);
    }

    #[test]
    fn test_alias_is_case_insensitive() {
        let resolved = resolve_model("baai/BGE-small-en-v1.5").unwrap();
        assert_eq!(resolved.model, EmbeddingModel::BGESmallENV15);
        assert_eq!(resolved.name, "BAAI/bge-small-en-v1.5");
    }

    #[test]
    fn test_variant_name_resolves() {
        let resolved = resolve_model("AllMiniLML6V2").unwrap();
        assert_eq!(resolved.model, EmbeddingModel::AllMiniLML6V2);
        assert_eq!(resolved.name, DEFAULT_MODEL);

        let by_code = resolve_model("Qdrant/all-MiniLM-L6-v2-onnx").unwrap();
        assert_eq!(by_code, resolved);
    }

    #[test]
    fn test_unknown_model() {
        assert!(matches!(
            resolve_model("acme/not-a-model"),
            Err(EmbeddingError::UnknownModel(name)) if name == "acme/not-a-model"
        ));
        assert!(resolve_model("   ").is_err());
    }
}
