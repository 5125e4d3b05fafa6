//! Bundle minification.
//!
//! Uses oxc for JavaScript bundles and lightningcss for compiled stylesheets.
//! Minification is best effort: input the minifier rejects is kept as is.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

/// Minify a script bundle. Bundles are classic scripts, not ES modules.
pub fn minify_js(source: &str) -> Option<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::cjs()).parse();
    if !ret.errors.is_empty() {
        return None;
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Some(code)
}

/// Minify compiled CSS.
pub fn minify_css(source: &str) -> Option<String> {
    let stylesheet = StyleSheet::parse(source, ParserOptions::default()).ok()?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .ok()?;
    Some(result.code)
}

/// Minify `content` when enabled, falling back to the original text.
pub fn maybe_minify(enabled: bool, content: String, minify: fn(&str) -> Option<String>) -> String {
    if !enabled {
        return content;
    }
    match minify(&content) {
        Some(minified) => minified,
        None => {
            crate::debug!("minify"; "minifier rejected input, keeping original");
            content
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minify_css() {
        let out = minify_css(".header {\n  color: red;\n}\n").unwrap();
        assert_eq!(out, ".header{color:red}");
    }

    #[test]
    fn test_minify_js_shrinks() {
        let src = "define('a.tpl', [], function () {\n    return \"<p>hi</p>\";\n});\n";
        let out = minify_js(src).unwrap();
        assert!(out.len() < src.len());
        assert!(out.contains("a.tpl"));
    }

    #[test]
    fn test_maybe_minify_falls_back() {
        let broken = "function (".to_string();
        assert_eq!(maybe_minify(true, broken.clone(), minify_js), broken);
        assert_eq!(maybe_minify(false, "a { }".into(), minify_css), "a { }");
    }
}
