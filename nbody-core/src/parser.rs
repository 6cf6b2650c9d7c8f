use crate::ast::{
    Axis, BinaryOp, BodyDecl, DetectorDecl, DetectorKind, Expr, FuncName, LetDecl, Scenario,
    SimulateDecl, SystemDecl, VecExpr,
};
use crate::diagnostics::Span;
use thiserror::Error;

/// Parse error with optional span information
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{message}")]
    SyntaxError {
        message: String,
        span: Option<Span>,
    },
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Option<Span>) -> Self {
        Self::SyntaxError {
            message: message.into(),
            span,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::SyntaxError {
            message: message.into(),
            span: None,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::SyntaxError { span, .. } => *span,
        }
    }
}

/// Helper to track byte offsets while parsing
struct ParseContext {
    line_offsets: Vec<usize>, // Byte offset of start of each line
}

impl ParseContext {
    fn new(source: &str) -> Self {
        let mut line_offsets = vec![0];
        let mut offset = 0;
        for ch in source.chars() {
            offset += ch.len_utf8();
            if ch == '\n' {
                line_offsets.push(offset);
            }
        }
        Self { line_offsets }
    }

    /// Get byte offset for start of line (0-indexed)
    fn line_start(&self, line: usize) -> usize {
        self.line_offsets.get(line).copied().unwrap_or(0)
    }

    /// Create a span for the entire line, newline excluded
    fn full_line_span(&self, line: usize, text: &str) -> Span {
        let start = self.line_start(line);
        Span::new(start, start + text.len())
    }
}

/// Parse a scenario from source text
pub fn parse_scenario(source: &str) -> Result<Scenario, ParseError> {
    let ctx = ParseContext::new(source);
    let mut lets = Vec::new();
    let mut system = None;
    let mut bodies = Vec::new();
    let mut simulate = None;
    let mut detectors = Vec::new();

    for (i, raw) in source.lines().enumerate() {
        let line = raw.trim();
        let span = Some(ctx.full_line_span(i, raw));

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with("let ") {
            lets.push(parse_let(line, span)?);
        } else if line.starts_with("system ") {
            if system.is_some() {
                return Err(ParseError::new("Duplicate 'system' declaration", span));
            }
            system = Some(parse_system(line, span)?);
        } else if line.starts_with("body ") {
            bodies.push(parse_body(line, span)?);
        } else if line.starts_with("simulate ") {
            if simulate.is_some() {
                return Err(ParseError::new("Duplicate 'simulate' declaration", span));
            }
            simulate = Some(parse_simulate(line, span)?);
        } else if line.starts_with("detect ") {
            detectors.push(parse_detector(line, span)?);
        } else {
            return Err(ParseError::new(
                format!("Unexpected token: {}", line.split_whitespace().next().unwrap_or("")),
                span,
            ));
        }
    }

    let system = system.ok_or_else(|| ParseError::message("Missing 'system' declaration"))?;

    Ok(Scenario {
        lets,
        system,
        bodies,
        simulate,
        detectors,
    })
}

/// Parse a let binding: `let name = expr`
fn parse_let(line: &str, span: Option<Span>) -> Result<LetDecl, ParseError> {
    let rest = line
        .strip_prefix("let ")
        .ok_or_else(|| ParseError::new("Expected 'let' keyword", span))?;

    let eq_pos = rest.find('=').ok_or_else(|| {
        ParseError::new(format!("Expected '=' in let binding: {}", line), span)
    })?;

    let name = rest[..eq_pos].trim();
    if !is_valid_identifier(name) {
        return Err(ParseError::new(
            format!("Invalid identifier in let binding: '{}'", name),
            span,
        ));
    }

    let expr = parse_expr(&rest[eq_pos + 1..], span)?;

    Ok(LetDecl {
        name: name.to_string(),
        expr,
        span,
    })
}

/// Parse the system parameters: `system G = x dt = y softening = z`
fn parse_system(line: &str, span: Option<Span>) -> Result<SystemDecl, ParseError> {
    let rest = line
        .strip_prefix("system ")
        .ok_or_else(|| ParseError::new("Expected 'system' keyword", span))?;

    let mut values = parse_assignments(rest, &["G", "dt", "softening"], line, span)?.into_iter();
    // parse_assignments yields exactly one expression per key
    let (Some(g), Some(dt), Some(softening)) = (values.next(), values.next(), values.next()) else {
        return Err(ParseError::new(format!("Malformed system declaration: {}", line), span));
    };

    Ok(SystemDecl {
        g,
        dt,
        softening,
        span,
    })
}

/// Parse a body: `body name at (x, y, z) [velocity (vx, vy, vz)] mass m`
fn parse_body(line: &str, span: Option<Span>) -> Result<BodyDecl, ParseError> {
    let rest = line
        .strip_prefix("body ")
        .ok_or_else(|| ParseError::new("Expected 'body' keyword", span))?;

    let at_pos = rest.find(" at ").ok_or_else(|| {
        ParseError::new(format!("Expected 'at' in body declaration: {}", line), span)
    })?;

    let name = rest[..at_pos].trim();
    if !is_valid_identifier(name) {
        return Err(ParseError::new(
            format!("Invalid body name '{}'", name),
            span,
        ));
    }

    let (position, rest) = parse_vec3(&rest[at_pos + 4..], line, span)?;

    let rest = rest.trim_start();
    let (velocity, rest) = match rest.strip_prefix("velocity") {
        Some(after) => {
            let (v, after) = parse_vec3(after, line, span)?;
            (Some(v), after.trim_start())
        }
        None => (None, rest),
    };

    let mass_str = rest.strip_prefix("mass ").ok_or_else(|| {
        ParseError::new(format!("Expected 'mass' in body declaration: {}", line), span)
    })?;
    let mass = parse_expr(mass_str, span)?;

    Ok(BodyDecl {
        name: name.to_string(),
        position,
        velocity,
        mass,
        span,
    })
}

/// Parse the headless run length: `simulate steps = n`
fn parse_simulate(line: &str, span: Option<Span>) -> Result<SimulateDecl, ParseError> {
    let rest = line
        .strip_prefix("simulate ")
        .ok_or_else(|| ParseError::new("Expected 'simulate' keyword", span))?;

    let steps = parse_assignments(rest, &["steps"], line, span)?
        .pop()
        .ok_or_else(|| ParseError::new(format!("Expected 'steps =' in simulate: {}", line), span))?;

    Ok(SimulateDecl { steps, span })
}

/// Parse a detector: `detect name = position(a).y`, `distance(a, b)`, `speed(a)`,
/// `energy()` or `momentum()`
fn parse_detector(line: &str, span: Option<Span>) -> Result<DetectorDecl, ParseError> {
    let rest = line
        .strip_prefix("detect ")
        .ok_or_else(|| ParseError::new("Expected 'detect' keyword", span))?;

    let eq_pos = rest.find('=').ok_or_else(|| {
        ParseError::new(format!("Expected '=' in detector: {}", line), span)
    })?;

    let name = rest[..eq_pos].trim();
    if !is_valid_identifier(name) {
        return Err(ParseError::new(
            format!("Invalid detector name '{}'", name),
            span,
        ));
    }
    let rest = rest[eq_pos + 1..].trim();

    let paren = rest.find('(').ok_or_else(|| {
        ParseError::new(format!("Expected '(' in detector: {}", line), span)
    })?;
    let kind_name = rest[..paren].trim();
    let (inner, suffix) = take_group(&rest[paren..]).ok_or_else(|| {
        ParseError::new(format!("Unbalanced parentheses in detector: {}", line), span)
    })?;
    let args: Vec<&str> = split_top_level(inner)
        .into_iter()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .collect();
    let suffix = suffix.trim();

    let expect_args = |n: usize| -> Result<(), ParseError> {
        if args.len() != n {
            return Err(ParseError::new(
                format!("'{}' expects {} argument(s), got {}: {}", kind_name, n, args.len(), line),
                span,
            ));
        }
        Ok(())
    };

    let kind = match kind_name {
        "position" => {
            expect_args(1)?;
            let axis = match suffix {
                "" | ".x" => Axis::X,
                ".y" => Axis::Y,
                ".z" => Axis::Z,
                other => {
                    return Err(ParseError::new(
                        format!("Unknown position component '{}'", other),
                        span,
                    ));
                }
            };
            DetectorKind::Position {
                body: args[0].to_string(),
                axis,
            }
        }
        "distance" => {
            expect_args(2)?;
            DetectorKind::Distance {
                a: args[0].to_string(),
                b: args[1].to_string(),
            }
        }
        "speed" => {
            expect_args(1)?;
            DetectorKind::Speed(args[0].to_string())
        }
        "energy" => {
            expect_args(0)?;
            DetectorKind::Energy
        }
        "momentum" => {
            expect_args(0)?;
            DetectorKind::Momentum
        }
        _ => {
            return Err(ParseError::new(
                format!("Unknown detector type: {}", kind_name),
                span,
            ));
        }
    };

    if !suffix.is_empty() && !matches!(kind, DetectorKind::Position { .. }) {
        return Err(ParseError::new(
            format!("Unexpected trailing input in detector: {}", suffix),
            span,
        ));
    }

    Ok(DetectorDecl {
        name: name.to_string(),
        kind,
        span,
    })
}

/// Parse `k1 = e1 k2 = e2 ...` with the keys in the given order
fn parse_assignments(
    s: &str,
    keys: &[&str],
    line: &str,
    span: Option<Span>,
) -> Result<Vec<Expr>, ParseError> {
    let mut rest = s.trim();
    let mut exprs = Vec::with_capacity(keys.len());

    for (idx, key) in keys.iter().enumerate() {
        let prefix = format!("{} = ", key);
        let after = rest.strip_prefix(prefix.as_str()).ok_or_else(|| {
            ParseError::new(format!("Expected '{} =' in: {}", key, line), span)
        })?;

        let value_end = match keys.get(idx + 1) {
            Some(next) => {
                let marker = format!(" {} = ", next);
                after.find(marker.as_str()).ok_or_else(|| {
                    ParseError::new(format!("Expected '{} =' in: {}", next, line), span)
                })?
            }
            None => after.len(),
        };

        exprs.push(parse_expr(&after[..value_end], span)?);
        rest = after[value_end..].trim_start();
    }

    Ok(exprs)
}

/// Parse a parenthesized `(x, y, z)` at the start of `s`, returning the rest
fn parse_vec3<'a>(
    s: &'a str,
    line: &str,
    span: Option<Span>,
) -> Result<(VecExpr, &'a str), ParseError> {
    let (inner, rest) = take_group(s.trim_start()).ok_or_else(|| {
        ParseError::new(format!("Expected '(x, y, z)' in: {}", line), span)
    })?;

    let coords = split_top_level(inner);
    if coords.len() != 3 {
        return Err(ParseError::new(
            format!("Expected three coordinates, got {}: {}", coords.len(), line),
            span,
        ));
    }

    let v = (
        parse_expr(coords[0], span)?,
        parse_expr(coords[1], span)?,
        parse_expr(coords[2], span)?,
    );
    Ok((v, rest))
}

/// Split a string starting with `(` into the group contents and what follows
/// the matching `)`
fn take_group(s: &str) -> Option<(&str, &str)> {
    if !s.starts_with('(') {
        return None;
    }
    let mut depth = 0usize;
    for (i, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&s[1..i], &s[i + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on commas that are not nested inside parentheses
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

// ============================================================================
// Expressions
// ============================================================================

/// Parse an expression
pub fn parse_expr(s: &str, span: Option<Span>) -> Result<Expr, ParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ParseError::new("Expected expression", span));
    }
    parse_expr_add(s, span)
}

/// Parse addition/subtraction (lowest precedence)
/// Splits at the rightmost binary + or - at paren depth 0
fn parse_expr_add(s: &str, span: Option<Span>) -> Result<Expr, ParseError> {
    let s = s.trim();

    let mut paren_depth = 0;
    let mut split = None;

    for (i, ch) in s.char_indices().rev() {
        match ch {
            ')' => paren_depth += 1,
            '(' => paren_depth -= 1,
            '+' | '-' if paren_depth == 0 && is_binary_operator_at(s, i) => {
                split = Some((i, ch));
                break;
            }
            _ => {}
        }
    }

    match split {
        Some((pos, op_char)) => {
            let op = if op_char == '+' { BinaryOp::Add } else { BinaryOp::Sub };
            Ok(Expr::Binary {
                op,
                left: Box::new(parse_expr_add(&s[..pos], span)?),
                right: Box::new(parse_expr_mul(&s[pos + 1..], span)?),
            })
        }
        None => parse_expr_mul(s, span),
    }
}

/// Parse multiplication/division
/// Splits at the rightmost * or / at paren depth 0
fn parse_expr_mul(s: &str, span: Option<Span>) -> Result<Expr, ParseError> {
    let s = s.trim();

    let mut paren_depth = 0;
    let mut split = None;

    for (i, ch) in s.char_indices().rev() {
        match ch {
            ')' => paren_depth += 1,
            '(' => paren_depth -= 1,
            '*' | '/' if paren_depth == 0 => {
                split = Some((i, ch));
                break;
            }
            _ => {}
        }
    }

    match split {
        Some((pos, op_char)) => {
            let op = if op_char == '*' { BinaryOp::Mul } else { BinaryOp::Div };
            Ok(Expr::Binary {
                op,
                left: Box::new(parse_expr_mul(&s[..pos], span)?),
                right: Box::new(parse_expr_unary(&s[pos + 1..], span)?),
            })
        }
        None => parse_expr_unary(s, span),
    }
}

/// Parse unary minus
fn parse_expr_unary(s: &str, span: Option<Span>) -> Result<Expr, ParseError> {
    let s = s.trim();
    match s.strip_prefix('-') {
        Some(inner) => Ok(Expr::UnaryMinus(Box::new(parse_expr_unary(inner, span)?))),
        None => parse_expr_primary(s, span),
    }
}

/// Parse primary expressions: literals, variables, function calls, parentheses
fn parse_expr_primary(s: &str, span: Option<Span>) -> Result<Expr, ParseError> {
    let s = s.trim();

    // Only digit-led text is a literal, so `inf` and `nan` stay identifiers
    if s.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return s
            .parse::<f64>()
            .map(Expr::Literal)
            .map_err(|_| ParseError::new(format!("Invalid number: {}", s), span));
    }

    if s.starts_with('(') {
        return match take_group(s) {
            Some((inner, rest)) if rest.trim().is_empty() => parse_expr(inner, span),
            _ => Err(ParseError::new(format!("Invalid expression: {}", s), span)),
        };
    }

    if let Some(paren_pos) = s.find('(') {
        let func_name = s[..paren_pos].trim();
        let (args_str, rest) = take_group(&s[paren_pos..]).ok_or_else(|| {
            ParseError::new(format!("Unbalanced parentheses: {}", s), span)
        })?;
        if !rest.trim().is_empty() {
            return Err(ParseError::new(format!("Invalid expression: {}", s), span));
        }

        let func = match func_name {
            "sin" => FuncName::Sin,
            "cos" => FuncName::Cos,
            "sqrt" => FuncName::Sqrt,
            "clamp" => FuncName::Clamp,
            _ => {
                return Err(ParseError::new(
                    format!("Unknown function '{}'", func_name),
                    span,
                ));
            }
        };

        let args = if args_str.trim().is_empty() {
            Vec::new()
        } else {
            split_top_level(args_str)
                .into_iter()
                .map(|arg| parse_expr(arg, span))
                .collect::<Result<Vec<_>, _>>()?
        };

        return Ok(Expr::Call { func, args });
    }

    if is_valid_identifier(s) {
        return Ok(Expr::Var(s.to_string()));
    }

    Err(ParseError::new(format!("Invalid expression: {}", s), span))
}

/// Whether the `+`/`-` at byte `i` is a binary operator rather than a sign
/// or part of a float exponent like `3.0e-6`
fn is_binary_operator_at(s: &str, i: usize) -> bool {
    let before = s[..i].trim_end();
    let Some(prev) = before.chars().last() else {
        return false;
    };
    if matches!(prev, '+' | '-' | '*' | '/' | '(' | ',') {
        return false;
    }
    if (prev == 'e' || prev == 'E') && before.len() == i {
        let token_start = before
            .char_indices()
            .rev()
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '.' || *c == '_'))
            .map(|(p, c)| p + c.len_utf8())
            .unwrap_or(0);
        let mantissa = &before[token_start..before.len() - 1];
        if !mantissa.is_empty() && mantissa.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return false;
        }
    }
    true
}

/// Check if a string is a valid identifier
fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
