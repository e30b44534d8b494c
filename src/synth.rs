//! Virtual synthesizer: turns a parsed spike id into a complete template
//! spec without touching storage.
//!
//! Output is a pure function of the id's dimensions. Well-known libraries get
//! framework-idiomatic bodies; everything else falls back to a generic
//! scaffold that still varies by pattern, style, and language, so unknown
//! combinations never fail.
use crate::id::{Prefix, SpikeId};
use crate::model::{FileTemplate, Origin, ParamDecl, PatchTemplate, TemplateSpec};
use std::collections::BTreeSet;

pub fn synthesize(id: &SpikeId) -> TemplateSpec {
    let mut spec = TemplateSpec {
        id: id.to_string(),
        name: spike_name(id),
        version: "0.1.0".to_string(),
        description: spike_description(id),
        stack: stack_for(id),
        tags: tags_for(id),
        params: params_for(id),
        files: Vec::new(),
        patches: Vec::new(),
        origin: Origin::Virtual,
    };

    if let Some((files, patches)) = specialized_bodies(id) {
        spec.files = files;
        spec.patches = patches;
    } else {
        let (files, patches) = generic_bodies(id);
        spec.files = files;
        spec.patches = patches;
    }

    if id.prefix == Prefix::Strike {
        // Strike spikes are the minimal cut: first file only, no docs.
        spec.files.truncate(1);
    } else if spec.patches.is_empty() {
        spec.files.push(notes_file(id));
    }

    spec
}

fn spike_name(id: &SpikeId) -> String {
    format!(
        "{} {} ({}, {})",
        display_lib(&id.lib),
        id.pattern,
        id.style,
        id.lang
    )
}

fn spike_description(id: &SpikeId) -> String {
    let depth = match id.prefix {
        Prefix::Gen => "full scaffold",
        Prefix::Strike => "minimal scaffold",
    };
    format!(
        "{} for a {} {} in {} ({} style)",
        depth,
        display_lib(&id.lib),
        id.pattern,
        lang_name(&id.lang),
        id.style
    )
}

fn stack_for(id: &SpikeId) -> BTreeSet<String> {
    [id.lib.clone(), runtime(&id.lang).to_string(), id.lang.clone()]
        .into_iter()
        .collect()
}

fn tags_for(id: &SpikeId) -> BTreeSet<String> {
    let mut tags: BTreeSet<String> = [
        id.lib.clone(),
        id.pattern.clone(),
        id.style.clone(),
        id.lang.clone(),
        "scaffold".to_string(),
    ]
    .into_iter()
    .collect();
    if id.prefix == Prefix::Strike {
        tags.insert("minimal".to_string());
    }
    if id.style == "secure" {
        tags.insert("security".to_string());
    }
    tags
}

fn params_for(id: &SpikeId) -> Vec<ParamDecl> {
    let mut params = vec![ParamDecl {
        name: "app_name".to_string(),
        required: true,
        default: Some("app".to_string()),
    }];
    match id.pattern.as_str() {
        "route" | "webhook" => params.push(ParamDecl {
            name: "route_path".to_string(),
            required: false,
            default: Some("/api/example".to_string()),
        }),
        "schema" | "model" | "crud" | "migration" => params.push(ParamDecl {
            name: "entity".to_string(),
            required: false,
            default: Some("item".to_string()),
        }),
        "service" | "worker" | "job" | "listener" => params.push(ParamDecl {
            name: "service_name".to_string(),
            required: false,
            default: Some("worker".to_string()),
        }),
        _ => {}
    }
    params
}

fn specialized_bodies(id: &SpikeId) -> Option<(Vec<FileTemplate>, Vec<PatchTemplate>)> {
    let files = match (id.lib.as_str(), id.pattern.as_str(), id.lang.as_str()) {
        ("nextjs", "route", "ts" | "js") => vec![FileTemplate {
            path: format!("app/api{{{{route_path}}}}/route.{}", id.lang),
            template: nextjs_route_body(id),
        }],
        ("express", "route", "ts" | "js") => vec![FileTemplate {
            path: format!("src/routes/{{{{app_name}}}}.{}", id.lang),
            template: express_route_body(id),
        }],
        ("express", "middleware", "ts" | "js") => vec![FileTemplate {
            path: format!("src/middleware/{{{{app_name}}}}.{}", id.lang),
            template: express_middleware_body(id),
        }],
        ("fastapi", "route", "py") => vec![FileTemplate {
            path: "app/routers/{{app_name}}.py".to_string(),
            template: fastapi_route_body(id),
        }],
        ("react", "component", "ts" | "js") => vec![FileTemplate {
            path: format!("src/components/{{{{app_name}}}}.{}x", id.lang),
            template: react_component_body(id),
        }],
        ("react", "hook", "ts" | "js") => vec![FileTemplate {
            path: format!("src/hooks/use{{{{app_name}}}}.{}", id.lang),
            template: react_hook_body(id),
        }],
        ("prisma", "schema" | "model", _) => vec![FileTemplate {
            path: "prisma/schema.prisma".to_string(),
            template: prisma_schema_body(id),
        }],
        ("next-auth", "provider", "ts" | "js") => vec![FileTemplate {
            path: format!("app/api/auth/[...nextauth]/route.{}", id.lang),
            template: next_auth_body(),
        }],
        ("stripe", "webhook", "ts" | "js") => vec![FileTemplate {
            path: format!("src/webhooks/stripe.{}", id.lang),
            template: stripe_webhook_body(id),
        }],
        ("axum", "route", "rs") => vec![FileTemplate {
            path: "src/routes/{{app_name}}.rs".to_string(),
            template: axum_route_body(),
        }],
        _ => return None,
    };
    Some((files, Vec::new()))
}

fn generic_bodies(id: &SpikeId) -> (Vec<FileTemplate>, Vec<PatchTemplate>) {
    if id.pattern == "config" {
        // Config spikes patch the project manifest instead of adding files.
        return (
            Vec::new(),
            vec![PatchTemplate {
                path: manifest_path(&id.lang).to_string(),
                diff: config_patch_body(id),
            }],
        );
    }

    let comment = comment_prefix(&id.lang);
    let mut body = format!(
        "{comment} {} {} ({} style)\n{comment} scaffold for {{{{app_name}}}}\n\n",
        display_lib(&id.lib),
        id.pattern,
        id.style
    );
    body.push_str(&generic_pattern_body(id));
    if id.style == "secure" {
        body.push_str(&format!(
            "\n{comment} validate all inputs before use; secrets come from the environment\n"
        ));
    }

    let files = vec![FileTemplate {
        path: format!(
            "src/{{{{app_name}}}}/{}.{}",
            id.pattern,
            file_ext(&id.lang)
        ),
        template: body,
    }];
    (files, Vec::new())
}

fn generic_pattern_body(id: &SpikeId) -> String {
    let comment = comment_prefix(&id.lang);
    match id.pattern.as_str() {
        "route" | "webhook" => format!(
            "{comment} handles requests at {{{{route_path}}}}\n{}\n",
            stub_fn(id, "handle")
        ),
        "schema" | "model" | "crud" | "migration" => format!(
            "{comment} persistence shape for {{{{entity}}}}\n{}\n",
            stub_fn(id, "define")
        ),
        "service" | "worker" | "job" | "listener" => format!(
            "{comment} long-running unit {{{{service_name}}}}\n{}\n",
            stub_fn(id, "run")
        ),
        _ => format!("{}\n", stub_fn(id, "main")),
    }
}

fn stub_fn(id: &SpikeId, name: &str) -> String {
    match id.lang.as_str() {
        "py" => format!("def {name}():\n    raise NotImplementedError"),
        "rb" => format!("def {name}\n  raise NotImplementedError\nend"),
        "go" => format!("func {name}() error {{\n\treturn nil\n}}"),
        "rs" => format!("pub fn {name}() {{\n    todo!()\n}}"),
        "java" => format!(
            "public static void {name}() {{\n    throw new UnsupportedOperationException();\n}}"
        ),
        "kt" => format!("fun {name}() {{\n    TODO()\n}}"),
        "php" => format!("function {name}() {{\n    throw new \\RuntimeException('not implemented');\n}}"),
        _ => format!("export function {name}() {{\n  throw new Error('not implemented');\n}}"),
    }
}

fn notes_file(id: &SpikeId) -> FileTemplate {
    FileTemplate {
        path: format!("docs/{}-{}.md", id.lib, id.pattern),
        template: format!(
            "# {}\n\nGenerated scaffold for `{{{{app_name}}}}`.\n\n- library: {}\n- pattern: {}\n- style: {}\n- language: {}\n",
            spike_name(id),
            id.lib,
            id.pattern,
            id.style,
            id.lang
        ),
    }
}

fn nextjs_route_body(id: &SpikeId) -> String {
    let typed = id.lang == "ts";
    let request_type = if typed { "request: Request" } else { "request" };
    let mut body = format!(
        "export async function GET({request_type}) {{\n  return Response.json({{ ok: true, app: '{{{{app_name}}}}' }});\n}}\n"
    );
    if id.style != "minimal" {
        body.push_str(&format!(
            "\nexport async function POST({request_type}) {{\n  const payload = await request.json();\n  return Response.json({{ received: payload }}, {{ status: 201 }});\n}}\n"
        ));
    }
    body
}

fn express_route_body(id: &SpikeId) -> String {
    let import = if id.lang == "ts" {
        "import { Router, Request, Response } from 'express';"
    } else {
        "const { Router } = require('express');"
    };
    format!(
        "{import}\n\nconst router = Router();\n\nrouter.get('{{{{route_path}}}}', (req, res) => {{\n  res.json({{ ok: true, app: '{{{{app_name}}}}' }});\n}});\n\nexport default router;\n"
    )
}

fn express_middleware_body(id: &SpikeId) -> String {
    let signature = if id.lang == "ts" {
        "(req: Request, res: Response, next: NextFunction)"
    } else {
        "(req, res, next)"
    };
    let guard = if id.style == "secure" {
        "  if (!req.headers.authorization) {\n    return res.status(401).json({ error: 'unauthorized' });\n  }\n"
    } else {
        ""
    };
    format!(
        "export function {{{{app_name}}}}Middleware{signature} {{\n{guard}  next();\n}}\n"
    )
}

fn fastapi_route_body(id: &SpikeId) -> String {
    let mut body = String::from(
        "from fastapi import APIRouter\n\nrouter = APIRouter()\n\n\n@router.get(\"{{route_path}}\")\nasync def read_root():\n    return {\"ok\": True, \"app\": \"{{app_name}}\"}\n",
    );
    if id.style == "secure" {
        body.push_str(
            "\n\n@router.get(\"{{route_path}}/me\")\nasync def read_me(token: str):\n    if not token:\n        raise ValueError(\"missing token\")\n    return {\"token\": token}\n",
        );
    }
    body
}

fn react_component_body(id: &SpikeId) -> String {
    let props = if id.lang == "ts" {
        "type Props = { title: string };\n\nexport function {{app_name}}({ title }: Props) {"
    } else {
        "export function {{app_name}}({ title }) {"
    };
    format!("{props}\n  return <section>{{title}}</section>;\n}}\n")
}

fn react_hook_body(id: &SpikeId) -> String {
    let typed = if id.lang == "ts" { "<boolean>" } else { "" };
    format!(
        "import {{ useState, useEffect }} from 'react';\n\nexport function use{{{{app_name}}}}() {{\n  const [ready, setReady] = useState{typed}(false);\n  useEffect(() => {{\n    setReady(true);\n  }}, []);\n  return ready;\n}}\n"
    )
}

fn prisma_schema_body(id: &SpikeId) -> String {
    let audit = if id.style == "advanced" || id.style == "secure" {
        "  createdAt DateTime @default(now())\n  updatedAt DateTime @updatedAt\n"
    } else {
        ""
    };
    format!(
        "model {{{{entity}}}} {{\n  id    Int     @id @default(autoincrement())\n  name  String\n{audit}}}\n"
    )
}

fn next_auth_body() -> String {
    "import NextAuth from 'next-auth';\n\nconst handler = NextAuth({\n  providers: [],\n  session: { strategy: 'jwt' },\n});\n\nexport { handler as GET, handler as POST };\n"
        .to_string()
}

fn stripe_webhook_body(id: &SpikeId) -> String {
    let verify = if id.style == "secure" {
        "  const signature = req.headers['stripe-signature'];\n  if (!signature) {\n    return res.status(400).send('missing signature');\n  }\n"
    } else {
        ""
    };
    format!(
        "export async function handleStripeWebhook(req, res) {{\n{verify}  const event = req.body;\n  res.json({{ received: true, type: event.type }});\n}}\n"
    )
}

fn axum_route_body() -> String {
    "use axum::{routing::get, Json, Router};\nuse serde_json::{json, Value};\n\npub fn router() -> Router {\n    Router::new().route(\"{{route_path}}\", get(handler))\n}\n\nasync fn handler() -> Json<Value> {\n    Json(json!({ \"ok\": true, \"app\": \"{{app_name}}\" }))\n}\n"
        .to_string()
}

fn config_patch_body(id: &SpikeId) -> String {
    format!(
        "--- {path}\n+++ {path}\n@@ config for {{{{app_name}}}} @@\n+# added by {id}\n",
        path = manifest_path(&id.lang),
        id = id
    )
}

fn manifest_path(lang: &str) -> &'static str {
    match lang {
        "py" => "pyproject.toml",
        "rs" => "Cargo.toml",
        "go" => "go.mod",
        "java" | "kt" => "build.gradle",
        "rb" => "Gemfile",
        "php" => "composer.json",
        _ => "package.json",
    }
}

pub(crate) fn display_lib(lib: &str) -> String {
    match lib {
        "nextjs" => "Next.js".to_string(),
        "fastapi" => "FastAPI".to_string(),
        "next-auth" => "NextAuth".to_string(),
        "react-query" => "React Query".to_string(),
        "drizzle-orm" => "Drizzle ORM".to_string(),
        "graphql" => "GraphQL".to_string(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        }
    }
}

fn lang_name(lang: &str) -> &'static str {
    match lang {
        "ts" => "TypeScript",
        "js" => "JavaScript",
        "py" => "Python",
        "go" => "Go",
        "rs" => "Rust",
        "java" => "Java",
        "kt" => "Kotlin",
        "rb" => "Ruby",
        "php" => "PHP",
        _ => "the target language",
    }
}

fn runtime(lang: &str) -> &'static str {
    match lang {
        "ts" | "js" => "node",
        "py" => "python",
        "go" => "go",
        "rs" => "rust",
        "java" | "kt" => "jvm",
        "rb" => "ruby",
        "php" => "php",
        _ => "generic",
    }
}

fn file_ext(lang: &str) -> &'static str {
    match lang {
        "ts" => "ts",
        "js" => "js",
        "py" => "py",
        "go" => "go",
        "rs" => "rs",
        "java" => "java",
        "kt" => "kt",
        "rb" => "rb",
        "php" => "php",
        _ => "txt",
    }
}

fn comment_prefix(lang: &str) -> &'static str {
    match lang {
        "py" | "rb" => "#",
        _ => "//",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{Prefix, SpikeId, LANGS, LIBRARIES, PATTERNS, STYLES};

    #[test]
    fn synthesis_is_deterministic() {
        let id = SpikeId::new(Prefix::Gen, "express", "route", "typed", "ts");
        assert_eq!(synthesize(&id), synthesize(&id));
    }

    #[test]
    fn unknown_combinations_still_produce_a_scaffold() {
        let id = SpikeId::new(Prefix::Gen, "acme-billing-sdk", "listener", "edge", "kt");
        let spec = synthesize(&id);
        assert!(!spec.files.is_empty());
        assert!(spec.files[0].template.contains("listener"));
        assert!(spec.tags.contains("acme-billing-sdk"));
    }

    #[test]
    fn every_vocabulary_tuple_synthesizes_nonempty_output() {
        for lib in LIBRARIES.iter().take(6) {
            for pattern in PATTERNS {
                for style in STYLES.iter().take(2) {
                    for lang in LANGS.iter().take(3) {
                        let id = SpikeId::new(Prefix::Gen, lib, pattern, style, lang);
                        let spec = synthesize(&id);
                        assert!(
                            !spec.files.is_empty() || !spec.patches.is_empty(),
                            "no bodies for {id}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn nextjs_route_gets_framework_body() {
        let id = SpikeId::new(Prefix::Gen, "nextjs", "route", "typed", "ts");
        let spec = synthesize(&id);
        assert!(spec.files[0].path.starts_with("app/api"));
        assert!(spec.files[0].template.contains("Response.json"));
    }

    #[test]
    fn strike_is_a_strict_subset_of_gen() {
        let gen = synthesize(&SpikeId::new(Prefix::Gen, "express", "route", "basic", "ts"));
        let strike = synthesize(&SpikeId::new(Prefix::Strike, "express", "route", "basic", "ts"));
        assert!(strike.files.len() < gen.files.len());
        assert_eq!(strike.files[0].path, gen.files[0].path);
    }

    #[test]
    fn config_pattern_emits_a_patch_not_a_file() {
        let id = SpikeId::new(Prefix::Strike, "redis", "config", "basic", "py");
        let spec = synthesize(&id);
        assert!(spec.files.is_empty());
        assert_eq!(spec.patches.len(), 1);
        assert_eq!(spec.patches[0].path, "pyproject.toml");
    }
}
