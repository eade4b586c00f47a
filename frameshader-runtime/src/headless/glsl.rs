//! Just enough GLSL ES understanding to validate sources and link programs.

use crate::error::ShaderStage;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum Qualifier {
    Uniform,
    Attribute,
    Varying,
    In,
    Out,
}

impl Qualifier {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "uniform" => Some(Qualifier::Uniform),
            "attribute" => Some(Qualifier::Attribute),
            "varying" => Some(Qualifier::Varying),
            "in" => Some(Qualifier::In),
            "out" => Some(Qualifier::Out),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct Declaration {
    pub qualifier: Qualifier,
    pub ty: String,
    pub name: String,
}

/// A uniform of a linked program.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct UniformDecl {
    pub ty: String,
    pub name: String,
}

const EXTERNAL_EXTENSION: &str = "GL_OES_EGL_image_external";
const PRECISIONS: [&str; 3] = ["lowp", "mediump", "highp"];

fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

fn check_balance(code: &str) -> Result<(), String> {
    let mut stack = Vec::new();
    for c in code.chars() {
        match c {
            '(' | '{' | '[' => stack.push(c),
            ')' | '}' | ']' => {
                let open = match c {
                    ')' => '(',
                    '}' => '{',
                    _ => '[',
                };
                if stack.pop() != Some(open) {
                    return Err(format!("ERROR: unexpected '{c}'"));
                }
            }
            _ => {}
        }
    }
    match stack.last() {
        Some(open) => Err(format!("ERROR: unclosed '{open}'")),
        None => Ok(()),
    }
}

/// Statements outside of any block.
fn top_level_statements(code: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for c in code.chars() {
        match c {
            '{' => {
                if depth == 0 {
                    current.clear();
                }
                depth += 1;
            }
            '}' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => statements.push(std::mem::take(&mut current)),
            _ if depth == 0 => current.push(c),
            _ => {}
        }
    }
    statements
}

fn parse_declaration(statement: &str) -> Vec<Declaration> {
    let mut tokens = statement.split_whitespace();
    let Some(qualifier) = tokens.next().and_then(Qualifier::parse) else {
        return Vec::new();
    };

    let mut tokens = tokens.skip_while(|t| PRECISIONS.contains(t));
    let Some(ty) = tokens.next() else {
        return Vec::new();
    };
    let rest = tokens.collect::<Vec<_>>().join(" ");

    rest.split(',')
        .filter_map(|declarator| {
            let name = declarator
                .split(['=', '['])
                .next()
                .map(str::trim)
                .filter(|name| !name.is_empty())?;
            Some(Declaration {
                qualifier,
                ty: ty.to_owned(),
                name: name.to_owned(),
            })
        })
        .collect()
}

/// Check a shader source and extract its interface.
///
/// Errors are formatted like a driver info log.
pub(crate) fn compile(stage: ShaderStage, source: &str) -> Result<Vec<Declaration>, String> {
    let source = strip_comments(source);
    if source.trim().is_empty() {
        return Err("ERROR: empty shader source".to_owned());
    }

    let mut extensions = Vec::new();
    let mut code = String::with_capacity(source.len());
    for line in source.lines() {
        let trimmed = line.trim_start();
        if let Some(directive) = trimmed.strip_prefix('#') {
            let mut tokens = directive.split_whitespace();
            if tokens.next() == Some("extension") {
                if let Some(name) = tokens.next() {
                    extensions.push(name.to_owned());
                }
            }
            code.push('\n');
        } else {
            code.push_str(line);
            code.push('\n');
        }
    }

    check_balance(&code)?;

    let flat = code.split_whitespace().collect::<Vec<_>>().join(" ");
    if !flat.contains("void main(") && !flat.contains("void main (") {
        return Err("ERROR: missing entry point 'void main()'".to_owned());
    }

    if flat.contains("samplerExternalOES") && !extensions.iter().any(|e| e == EXTERNAL_EXTENSION) {
        return Err(format!(
            "ERROR: 'samplerExternalOES' requires extension {EXTERNAL_EXTENSION}"
        ));
    }

    let declarations: Vec<Declaration> = top_level_statements(&code)
        .iter()
        .flat_map(|statement| parse_declaration(statement))
        .collect();

    match stage {
        ShaderStage::Vertex => {
            if !flat.contains("gl_Position") {
                return Err("ERROR: vertex shader does not write gl_Position".to_owned());
            }
        }
        ShaderStage::Fragment => {
            let declares_output = declarations
                .iter()
                .any(|d| d.qualifier == Qualifier::Out && d.ty == "vec4");
            if !flat.contains("gl_FragColor") && !declares_output {
                return Err("ERROR: fragment shader does not write a color".to_owned());
            }
            if let Some(attribute) = declarations
                .iter()
                .find(|d| d.qualifier == Qualifier::Attribute)
            {
                return Err(format!(
                    "ERROR: 'attribute' {} not allowed in a fragment shader",
                    attribute.name
                ));
            }
        }
    }

    Ok(declarations)
}

/// Match the varyings of both stages and merge their uniforms.
pub(crate) fn link(
    vertex: &[Declaration],
    fragment: &[Declaration],
) -> Result<Vec<UniformDecl>, String> {
    for input in fragment
        .iter()
        .filter(|d| matches!(d.qualifier, Qualifier::Varying | Qualifier::In))
    {
        let written = vertex.iter().find(|d| {
            matches!(d.qualifier, Qualifier::Varying | Qualifier::Out) && d.name == input.name
        });
        match written {
            Some(output) if output.ty == input.ty => {}
            Some(output) => {
                return Err(format!(
                    "ERROR: varying '{}' declared as {} and {}",
                    input.name, output.ty, input.ty
                ))
            }
            None => {
                return Err(format!(
                    "ERROR: varying '{}' is not written by the vertex shader",
                    input.name
                ))
            }
        }
    }

    let mut uniforms: Vec<UniformDecl> = Vec::new();
    for decl in vertex
        .iter()
        .chain(fragment)
        .filter(|d| d.qualifier == Qualifier::Uniform)
    {
        match uniforms.iter().find(|u| u.name == decl.name) {
            Some(existing) if existing.ty != decl.ty => {
                return Err(format!(
                    "ERROR: uniform '{}' declared as {} and {}",
                    decl.name, existing.ty, decl.ty
                ))
            }
            Some(_) => {}
            None => uniforms.push(UniformDecl {
                ty: decl.ty.clone(),
                name: decl.name.clone(),
            }),
        }
    }
    Ok(uniforms)
}
