//! Runtime patch script (`/define_patch.js`).
//!
//! The host platform registers every template as an empty AMD module
//! (`define("x.tpl", function(){})`). Loaded next to the preview bundles those
//! stubs would replace the real templates, so the patch wraps `define` and
//! drops them.

/// Route of the patch script.
pub const DEFINE_PATCH_PATH: &str = "/define_patch.js";

/// Generate the patch script.
pub fn define_patch() -> String {
    let script = r#"function define_patch() {
	var src_define = define;
	define = function define(name, cb) {
		var is_tpl = typeof name === 'string' && /\.tpl$/.test(name);
		var cb_string = cb ? cb.toString().replace(/\s/g, '') : '';
		var is_empty_cb = cb_string === 'function(){}';

		if (is_tpl && is_empty_cb) {
			return;
		}
		return src_define.apply(this, arguments);
	};

	define.amd = {
		jQuery: true
	};
}"#;
    format!("{script}; define_patch();")
}
