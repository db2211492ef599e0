//! Built-in project templates.
//!
//! The catalog is intentionally small: one React starter and one plain
//! HTML/JS starter. Callers may also build their own [`Template`] values.

use std::collections::BTreeMap;

use crate::models::{Framework, Template};

const REACT_INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <title>React App</title>
  </head>
  <body>
    <div id="root"></div>
    <script type="module" src="/src/main.jsx"></script>
  </body>
</html>
"#;

const REACT_MAIN: &str = r#"import React from "react";
import { createRoot } from "react-dom/client";
import App from "./App.jsx";

createRoot(document.getElementById("root")).render(<App />);
"#;

const REACT_APP: &str = r#"export default function App() {
  return <h1>Hello, React</h1>;
}
"#;

const VANILLA_INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <title>Vanilla App</title>
    <link rel="stylesheet" href="style.css" />
  </head>
  <body>
    <h1 id="title">Hello, world</h1>
    <script src="main.js"></script>
  </body>
</html>
"#;

const VANILLA_MAIN: &str = r#"document.getElementById("title").textContent = "Hello from main.js";
"#;

const VANILLA_STYLE: &str = r#"body {
  font-family: system-ui, sans-serif;
}
"#;

/// All templates shipped with the binary.
pub fn builtin() -> Vec<Template> {
    vec![react(), vanilla()]
}

/// Look up a built-in template by id.
pub fn find(id: &str) -> Option<Template> {
    builtin().into_iter().find(|t| t.id == id)
}

fn react() -> Template {
    Template {
        id: "react".to_string(),
        name: "React Starter".to_string(),
        framework: Framework::React,
        entry_file: "src/main.jsx".to_string(),
        files: files(&[
            ("index.html", REACT_INDEX_HTML),
            ("src/main.jsx", REACT_MAIN),
            ("src/App.jsx", REACT_APP),
        ]),
    }
}

fn vanilla() -> Template {
    Template {
        id: "vanilla".to_string(),
        name: "Vanilla Starter".to_string(),
        framework: Framework::Vanilla,
        entry_file: "index.html".to_string(),
        files: files(&[
            ("index.html", VANILLA_INDEX_HTML),
            ("main.js", VANILLA_MAIN),
            ("style.css", VANILLA_STYLE),
        ]),
    }
}

fn files(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(path, content)| (path.to_string(), content.to_string()))
        .collect()
}
