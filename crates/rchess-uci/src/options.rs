//! UCI option definitions and `setoption` handling
//!
//! エンジン固有の `Hash` / `Clear Hash` / `EvalFile` に加え、
//! 探索係数（`SearchParams::option_specs`）をそのまま spin option として公開する。

use anyhow::{Context, Result, anyhow, bail};
use rchess_core::eval::EvalParams;
use rchess_core::search::{Engine, SearchParams};
use rchess_core::tt::DEFAULT_TT_MB;

/// Hash の最小値（MiB）
pub const HASH_MIN_MB: usize = 1;
/// Hash の最大値（MiB）
pub const HASH_MAX_MB: usize = 65536;

/// `EvalFile` 未指定を表す値
pub const EVAL_FILE_EMPTY: &str = "<empty>";

/// `uci` に対して送る option 行（先頭の `option ` は含まない）
pub fn option_lines() -> Vec<String> {
    let mut lines = vec![
        format!("name Hash type spin default {DEFAULT_TT_MB} min {HASH_MIN_MB} max {HASH_MAX_MB}"),
        "name Clear Hash type button".to_string(),
        format!("name EvalFile type string default {EVAL_FILE_EMPTY}"),
    ];
    lines.extend(SearchParams::option_specs().iter().map(|spec| {
        format!(
            "name {} type spin default {} min {} max {}",
            spec.uci_name, spec.default, spec.min, spec.max
        )
    }));
    lines
}

/// `setoption` を適用する
///
/// 成功時、GUIに知らせるべき補足（clamp した等）があれば `Some` で返す。
pub fn apply_option(engine: &mut Engine, name: &str, value: Option<&str>) -> Result<Option<String>> {
    if name.eq_ignore_ascii_case("Hash") {
        let raw = value.ok_or_else(|| anyhow!("Hash requires a value"))?;
        let mb: usize = raw.trim().parse().with_context(|| format!("invalid Hash value: {raw}"))?;
        let applied = mb.clamp(HASH_MIN_MB, HASH_MAX_MB);
        engine.set_hash_size(applied);
        log::info!("hash size set to {applied} MiB");
        return Ok((applied != mb).then(|| format!("Hash clamped to {applied}")));
    }

    if name.eq_ignore_ascii_case("Clear Hash") {
        engine.clear_hash();
        return Ok(None);
    }

    if name.eq_ignore_ascii_case("EvalFile") {
        match value.map(str::trim) {
            None | Some("") | Some(EVAL_FILE_EMPTY) => {
                engine.set_eval_params(EvalParams::default());
                log::info!("evaluation reset to built-in parameters");
                return Ok(None);
            }
            Some(path) => {
                let params = EvalParams::load_model(path)
                    .with_context(|| format!("failed to load EvalFile '{path}'"))?;
                engine.set_eval_params(params);
                return Ok(Some(format!("EvalFile loaded: {path}")));
            }
        }
    }

    let Some(spec) = SearchParams::option_specs()
        .iter()
        .find(|spec| spec.uci_name.eq_ignore_ascii_case(name))
    else {
        bail!("unknown option: {name}");
    };
    let raw = value.ok_or_else(|| anyhow!("{} requires a value", spec.uci_name))?;
    let parsed: i32 = raw
        .trim()
        .parse()
        .with_context(|| format!("invalid {} value: {raw}", spec.uci_name))?;
    let result = engine
        .set_option(spec.uci_name, parsed)
        .ok_or_else(|| anyhow!("unknown option: {name}"))?;
    log::debug!("{} = {}", spec.uci_name, result.applied);

    Ok(result.clamped.then(|| {
        format!(
            "{} clamped to {} (range {}..={})",
            spec.uci_name, result.applied, result.min, result.max
        )
    }))
}
