//! Recursive-descent parser for VRML97 scene graphs.
//!
//! # Supported Syntax
//!
//! - `DEF Name Type { ... }` and `USE Name` (single pass, no forward references)
//! - `Group`, `Transform`, `Anchor`, `Billboard`, `Collision`, `Switch`, `LOD`
//! - `Shape`, `Appearance`, `Material`, `ImageTexture`
//! - `IndexedFaceSet` with `Coordinate`, `Normal`, `Color`, `TextureCoordinate`
//! - `ROUTE`, `PROTO` and `EXTERNPROTO` statements are skipped
//!
//! Any other node type is skipped with a warning. Its fields, and unknown
//! fields on known nodes, are parsed generically and discarded, so a DEF
//! nested inside them can still be USE'd later.

use std::collections::{HashMap, VecDeque};

use thiserror::Error;
use wrlpack_math::{Vec3, Vec4};

use super::lexer::{LexError, Lexer, SourcePos, Token, TokenKind};
use super::types::*;
use crate::warning::Warning;

/// Errors that can occur during parsing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Lex error: {0}")]
    Lex(#[from] LexError),

    #[error("Parse error at {pos}: {message}")]
    Syntax { pos: SourcePos, message: String },

    #[error("Unexpected end of input at {pos} while reading {context}")]
    UnexpectedEof { pos: SourcePos, context: String },

    #[error("USE '{name}' at {pos} does not refer to a previously DEF'd node")]
    UnresolvedReference { name: String, pos: SourcePos },
}

impl ParseError {
    /// Source position the error refers to.
    pub fn pos(&self) -> SourcePos {
        match self {
            ParseError::Lex(err) => err.pos(),
            ParseError::Syntax { pos, .. }
            | ParseError::UnexpectedEof { pos, .. }
            | ParseError::UnresolvedReference { pos, .. } => *pos,
        }
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

fn syntax(pos: SourcePos, message: impl Into<String>) -> ParseError {
    ParseError::Syntax {
        pos,
        message: message.into(),
    }
}

/// Output of a successful parse.
#[derive(Debug)]
pub struct ParsedScene {
    pub arena: NodeArena,
    /// Implicit Group holding the top-level nodes
    pub root: NodeId,
    pub warnings: Vec<Warning>,
}

/// Single-pass VRML parser.
pub struct VrmlParser<'a> {
    lexer: Lexer<'a>,
    lookahead: VecDeque<Token>,
    arena: NodeArena,
    names: HashMap<String, NodeId>,
    warnings: Vec<Warning>,
}

impl<'a> VrmlParser<'a> {
    pub fn new(content: &'a str) -> Self {
        Self {
            lexer: Lexer::new(content),
            lookahead: VecDeque::new(),
            arena: NodeArena::new(),
            names: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Parse the whole document.
    pub fn parse(mut self) -> ParseResult<ParsedScene> {
        let mut children = Vec::new();

        loop {
            if self.try_skip_statement()? {
                continue;
            }
            match self.peek_kind()? {
                None => break,
                Some(TokenKind::Comma) => {
                    self.advance()?;
                }
                Some(_) => {
                    if let Some(id) = self.parse_node()? {
                        children.push(id);
                    }
                }
            }
        }

        let root = self.arena.push(SceneNode {
            name: None,
            pos: SourcePos::new(1, 1),
            kind: NodeKind::Group(GroupNode { children }),
        });

        log::debug!(
            "Parsed {} nodes, {} DEF names",
            self.arena.len(),
            self.names.len()
        );

        Ok(ParsedScene {
            arena: self.arena,
            root,
            warnings: self.warnings,
        })
    }

    // ------------------------------------------------------------------
    // Token access
    // ------------------------------------------------------------------

    fn fill(&mut self, n: usize) -> ParseResult<()> {
        while self.lookahead.len() < n {
            match self.lexer.next() {
                Some(token) => self.lookahead.push_back(token?),
                None => break,
            }
        }
        Ok(())
    }

    fn peek(&mut self) -> ParseResult<Option<&Token>> {
        self.fill(1)?;
        Ok(self.lookahead.front())
    }

    fn peek_kind(&mut self) -> ParseResult<Option<TokenKind>> {
        Ok(self.peek()?.map(|t| t.kind.clone()))
    }

    fn advance(&mut self) -> ParseResult<Option<Token>> {
        self.fill(1)?;
        Ok(self.lookahead.pop_front())
    }

    fn eof(&self, context: &str) -> ParseError {
        ParseError::UnexpectedEof {
            pos: self.lexer.pos(),
            context: context.to_string(),
        }
    }

    fn expect(&mut self, context: &str) -> ParseResult<Token> {
        match self.advance()? {
            Some(token) => Ok(token),
            None => Err(self.eof(context)),
        }
    }

    fn expect_identifier(&mut self, context: &str) -> ParseResult<Token> {
        let token = self.expect(context)?;
        if token.kind != TokenKind::Identifier {
            return Err(syntax(
                token.pos,
                format!("Expected {}, found {}", context, token.describe()),
            ));
        }
        Ok(token)
    }

    fn expect_kind(&mut self, kind: TokenKind, context: &str) -> ParseResult<Token> {
        let token = self.expect(context)?;
        if token.kind != kind {
            return Err(syntax(
                token.pos,
                format!("Expected {}, found {}", context, token.describe()),
            ));
        }
        Ok(token)
    }

    fn skip_commas(&mut self) -> ParseResult<()> {
        while self.peek_kind()? == Some(TokenKind::Comma) {
            self.advance()?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    /// Parse a node, `DEF`, `USE` or `NULL`. `NULL` yields `None`.
    fn parse_node(&mut self) -> ParseResult<Option<NodeId>> {
        let token = self.expect("node")?;
        if token.kind != TokenKind::Identifier {
            return Err(syntax(
                token.pos,
                format!("Expected a node, found {}", token.describe()),
            ));
        }

        match token.text.as_str() {
            "NULL" => Ok(None),
            "USE" => {
                let name = self.expect_identifier("name after USE")?;
                match self.names.get(&name.text) {
                    Some(&id) => Ok(Some(id)),
                    None => Err(ParseError::UnresolvedReference {
                        name: name.text,
                        pos: name.pos,
                    }),
                }
            }
            "DEF" => {
                let name = self.expect_identifier("name after DEF")?;
                let type_token = self.expect_identifier("node type after DEF name")?;
                if matches!(type_token.text.as_str(), "DEF" | "USE" | "NULL") {
                    return Err(syntax(
                        type_token.pos,
                        format!("DEF '{}' must be followed by a node type", name.text),
                    ));
                }
                let id = self.parse_node_body(type_token, Some(name.text.clone()))?;
                self.register(name, id);
                Ok(Some(id))
            }
            _ => self.parse_node_body(token, None).map(Some),
        }
    }

    fn register(&mut self, name: Token, id: NodeId) {
        if self.names.insert(name.text.clone(), id).is_some() {
            log::warn!("DEF '{}' at {} redefines an earlier node", name.text, name.pos);
            self.warnings.push(Warning::DefRedefined {
                name: name.text,
                pos: name.pos,
            });
        }
    }

    fn parse_node_body(&mut self, type_token: Token, name: Option<String>) -> ParseResult<NodeId> {
        let type_name = type_token.text.as_str();
        self.expect_kind(TokenKind::OpenBrace, &format!("'{{' after {}", type_name))?;

        let kind = match type_name {
            "Transform" => NodeKind::Transform(self.parse_transform()?),
            "Group" | "Anchor" | "Billboard" | "Collision" => {
                NodeKind::Group(self.parse_group(type_name)?)
            }
            "Switch" => NodeKind::Group(self.parse_switch()?),
            "LOD" => NodeKind::Group(self.parse_lod()?),
            "Shape" => NodeKind::Shape(self.parse_shape()?),
            "Appearance" => NodeKind::Appearance(self.parse_appearance()?),
            "Material" => NodeKind::Material(self.parse_material()?),
            "ImageTexture" => NodeKind::ImageTexture(self.parse_image_texture()?),
            "IndexedFaceSet" => NodeKind::IndexedFaceSet(self.parse_indexed_face_set()?),
            "Coordinate" => NodeKind::Coordinate(self.parse_vec3_property("Coordinate", "point")?),
            "Normal" => NodeKind::Normal(self.parse_vec3_property("Normal", "vector")?),
            "Color" => NodeKind::Color(self.parse_vec3_property("Color", "color")?),
            "TextureCoordinate" => NodeKind::TextureCoordinate(self.parse_tex_coord()?),
            other => {
                self.skip_unknown_node(other)?;
                log::info!("Skipping unsupported node '{}' at {}", other, type_token.pos);
                self.warnings.push(Warning::UnsupportedNode {
                    type_name: other.to_string(),
                    pos: type_token.pos,
                });
                NodeKind::Unsupported(other.to_string())
            }
        };

        Ok(self.arena.push(SceneNode {
            name,
            pos: type_token.pos,
            kind,
        }))
    }

    /// Run `field` for each field of a node body until the closing brace.
    /// `field` returns `false` for names it does not handle; those values
    /// are skipped.
    fn parse_fields<F>(&mut self, node_type: &str, mut field: F) -> ParseResult<()>
    where
        F: FnMut(&mut Self, &Token) -> ParseResult<bool>,
    {
        let context = format!("fields of {}", node_type);
        loop {
            if self.try_skip_statement()? {
                continue;
            }
            let token = self.expect(&context)?;
            match token.kind {
                TokenKind::CloseBrace => return Ok(()),
                TokenKind::Comma => continue,
                TokenKind::Identifier => {
                    if !field(self, &token)? {
                        log::debug!(
                            "Ignoring field '{}' of {} at {}",
                            token.text,
                            node_type,
                            token.pos
                        );
                        self.skip_value(&token)?;
                    }
                }
                _ => {
                    return Err(syntax(
                        token.pos,
                        format!("Expected a field name in {}, found {}", node_type, token.describe()),
                    ))
                }
            }
        }
    }

    fn parse_transform(&mut self) -> ParseResult<TransformNode> {
        let mut node = TransformNode::default();
        self.parse_fields("Transform", |p, field| {
            match field.text.as_str() {
                "translation" => node.translation = Vec3::from(p.parse_floats::<3>(field)?),
                "rotation" => node.rotation = Vec4::from(p.parse_floats::<4>(field)?),
                "scale" => node.scale = Vec3::from(p.parse_floats::<3>(field)?),
                "scaleOrientation" => {
                    node.scale_orientation = Vec4::from(p.parse_floats::<4>(field)?)
                }
                "center" => node.center = Vec3::from(p.parse_floats::<3>(field)?),
                "children" => node.children.extend(p.parse_mf_node(field)?),
                _ => return Ok(false),
            }
            Ok(true)
        })?;
        Ok(node)
    }

    fn parse_group(&mut self, type_name: &str) -> ParseResult<GroupNode> {
        let mut node = GroupNode::default();
        self.parse_fields(type_name, |p, field| {
            if field.text == "children" {
                node.children.extend(p.parse_mf_node(field)?);
                return Ok(true);
            }
            Ok(false)
        })?;
        Ok(node)
    }

    /// A Switch keeps only its active choice.
    fn parse_switch(&mut self) -> ParseResult<GroupNode> {
        let mut choices = Vec::new();
        let mut which = -1;
        self.parse_fields("Switch", |p, field| {
            match field.text.as_str() {
                "choice" => choices = p.parse_mf_node(field)?,
                "whichChoice" => which = p.parse_int(field)?,
                _ => return Ok(false),
            }
            Ok(true)
        })?;

        let children = usize::try_from(which)
            .ok()
            .and_then(|i| choices.get(i).copied())
            .into_iter()
            .collect();
        Ok(GroupNode { children })
    }

    /// An LOD keeps only its most detailed level.
    fn parse_lod(&mut self) -> ParseResult<GroupNode> {
        let mut levels = Vec::new();
        self.parse_fields("LOD", |p, field| {
            if field.text == "level" {
                levels = p.parse_mf_node(field)?;
                return Ok(true);
            }
            Ok(false)
        })?;
        Ok(GroupNode {
            children: levels.into_iter().take(1).collect(),
        })
    }

    fn parse_shape(&mut self) -> ParseResult<ShapeNode> {
        let mut node = ShapeNode::default();
        self.parse_fields("Shape", |p, field| {
            match field.text.as_str() {
                "appearance" => node.appearance = p.parse_node()?,
                "geometry" => node.geometry = p.parse_node()?,
                _ => return Ok(false),
            }
            Ok(true)
        })?;
        Ok(node)
    }

    fn parse_appearance(&mut self) -> ParseResult<AppearanceNode> {
        let mut node = AppearanceNode::default();
        self.parse_fields("Appearance", |p, field| {
            match field.text.as_str() {
                "material" => node.material = p.parse_node()?,
                "texture" => node.texture = p.parse_node()?,
                _ => return Ok(false),
            }
            Ok(true)
        })?;
        Ok(node)
    }

    fn parse_material(&mut self) -> ParseResult<MaterialNode> {
        let mut node = MaterialNode::default();
        self.parse_fields("Material", |p, field| {
            match field.text.as_str() {
                "diffuseColor" => node.diffuse_color = Vec3::from(p.parse_floats::<3>(field)?),
                "specularColor" => node.specular_color = Vec3::from(p.parse_floats::<3>(field)?),
                "emissiveColor" => node.emissive_color = Vec3::from(p.parse_floats::<3>(field)?),
                "ambientIntensity" => node.ambient_intensity = p.parse_float(field)?,
                "shininess" => node.shininess = p.parse_float(field)?,
                "transparency" => node.transparency = p.parse_float(field)?,
                _ => return Ok(false),
            }
            Ok(true)
        })?;
        Ok(node)
    }

    fn parse_image_texture(&mut self) -> ParseResult<ImageTextureNode> {
        let mut node = ImageTextureNode::default();
        self.parse_fields("ImageTexture", |p, field| {
            if field.text == "url" {
                node.url = p.parse_mf_string(field)?;
                return Ok(true);
            }
            Ok(false)
        })?;
        Ok(node)
    }

    fn parse_indexed_face_set(&mut self) -> ParseResult<IndexedFaceSet> {
        let mut node = IndexedFaceSet::default();
        self.parse_fields("IndexedFaceSet", |p, field| {
            match field.text.as_str() {
                "coord" => node.coord = p.parse_node()?,
                "normal" => node.normal = p.parse_node()?,
                "color" => node.color = p.parse_node()?,
                "texCoord" => node.tex_coord = p.parse_node()?,
                "coordIndex" => node.coord_index = p.parse_mf_int(field)?,
                "normalIndex" => node.normal_index = p.parse_mf_int(field)?,
                "colorIndex" => node.color_index = p.parse_mf_int(field)?,
                "texCoordIndex" => node.tex_coord_index = p.parse_mf_int(field)?,
                "normalPerVertex" => node.normal_per_vertex = p.parse_bool(field)?,
                "colorPerVertex" => node.color_per_vertex = p.parse_bool(field)?,
                "ccw" => node.ccw = p.parse_bool(field)?,
                _ => return Ok(false),
            }
            Ok(true)
        })?;
        Ok(node)
    }

    /// Coordinate, Normal and Color all hold a single MFVec3f field.
    fn parse_vec3_property(&mut self, node_type: &str, field_name: &str) -> ParseResult<Vec<Vec3>> {
        let mut values = Vec::new();
        self.parse_fields(node_type, |p, field| {
            if field.text == field_name {
                values = p
                    .parse_mf_floats(field, 3)?
                    .chunks_exact(3)
                    .map(Vec3::from_slice)
                    .collect();
                return Ok(true);
            }
            Ok(false)
        })?;
        Ok(values)
    }

    fn parse_tex_coord(&mut self) -> ParseResult<Vec<[f32; 2]>> {
        let mut values = Vec::new();
        self.parse_fields("TextureCoordinate", |p, field| {
            if field.text == "point" {
                values = p
                    .parse_mf_floats(field, 2)?
                    .chunks_exact(2)
                    .map(|uv| [uv[0], uv[1]])
                    .collect();
                return Ok(true);
            }
            Ok(false)
        })?;
        Ok(values)
    }

    // ------------------------------------------------------------------
    // Field values
    // ------------------------------------------------------------------

    fn parse_number(&mut self, field: &Token) -> ParseResult<f64> {
        let token = self.expect(&format!("value of '{}'", field.text))?;
        match token.kind {
            TokenKind::Number(value) => Ok(value),
            _ => Err(syntax(
                token.pos,
                format!("Expected a number for '{}', found {}", field.text, token.describe()),
            )),
        }
    }

    fn parse_float(&mut self, field: &Token) -> ParseResult<f32> {
        self.parse_number(field).map(|v| v as f32)
    }

    fn parse_int(&mut self, field: &Token) -> ParseResult<i32> {
        let pos = self.peek()?.map(|t| t.pos).unwrap_or(field.pos);
        let value = self.parse_number(field)?;
        to_int(value).ok_or_else(|| {
            syntax(pos, format!("Expected an integer for '{}', found {}", field.text, value))
        })
    }

    fn parse_bool(&mut self, field: &Token) -> ParseResult<bool> {
        let token = self.expect(&format!("value of '{}'", field.text))?;
        match (&token.kind, token.text.as_str()) {
            (TokenKind::Identifier, "TRUE") => Ok(true),
            (TokenKind::Identifier, "FALSE") => Ok(false),
            _ => Err(syntax(
                token.pos,
                format!("Expected TRUE or FALSE for '{}', found {}", field.text, token.describe()),
            )),
        }
    }

    /// A fixed-size tuple such as SFVec3f or SFRotation.
    fn parse_floats<const N: usize>(&mut self, field: &Token) -> ParseResult<[f32; N]> {
        let mut values = [0.0; N];
        for value in values.iter_mut() {
            self.skip_commas()?;
            *value = self.parse_float(field)?;
        }
        Ok(values)
    }

    /// A bracketed number list, or a single bare tuple of `arity` numbers.
    fn parse_mf_numbers(&mut self, field: &Token, arity: usize) -> ParseResult<Vec<f64>> {
        if self.peek_kind()? != Some(TokenKind::OpenBracket) {
            let mut values = Vec::with_capacity(arity);
            for _ in 0..arity {
                self.skip_commas()?;
                values.push(self.parse_number(field)?);
            }
            return Ok(values);
        }

        let open = self.expect("'['")?;
        let mut values = Vec::new();
        loop {
            let token = self.expect(&format!("values of '{}'", field.text))?;
            match token.kind {
                TokenKind::CloseBracket => break,
                TokenKind::Comma => continue,
                TokenKind::Number(value) => values.push(value),
                _ => {
                    return Err(syntax(
                        token.pos,
                        format!(
                            "Expected a number or ']' in '{}', found {}",
                            field.text,
                            token.describe()
                        ),
                    ))
                }
            }
        }

        if values.len() % arity != 0 {
            return Err(syntax(
                open.pos,
                format!(
                    "'{}' has {} values, which is not a multiple of {}",
                    field.text,
                    values.len(),
                    arity
                ),
            ));
        }
        Ok(values)
    }

    fn parse_mf_floats(&mut self, field: &Token, arity: usize) -> ParseResult<Vec<f32>> {
        Ok(self
            .parse_mf_numbers(field, arity)?
            .into_iter()
            .map(|v| v as f32)
            .collect())
    }

    fn parse_mf_int(&mut self, field: &Token) -> ParseResult<Vec<i32>> {
        self.parse_mf_numbers(field, 1)?
            .into_iter()
            .map(|value| {
                to_int(value).ok_or_else(|| {
                    syntax(
                        field.pos,
                        format!("'{}' contains non-integer value {}", field.text, value),
                    )
                })
            })
            .collect()
    }

    fn parse_mf_string(&mut self, field: &Token) -> ParseResult<Vec<String>> {
        let bracketed = self.peek_kind()? == Some(TokenKind::OpenBracket);
        if bracketed {
            self.advance()?;
        }

        let mut values = Vec::new();
        loop {
            let token = self.expect(&format!("values of '{}'", field.text))?;
            match token.kind {
                TokenKind::String => {
                    values.push(token.text);
                    if !bracketed {
                        break;
                    }
                }
                TokenKind::Comma if bracketed => continue,
                TokenKind::CloseBracket if bracketed => break,
                _ => {
                    return Err(syntax(
                        token.pos,
                        format!("Expected a string for '{}', found {}", field.text, token.describe()),
                    ))
                }
            }
        }
        Ok(values)
    }

    /// MFNode value: a bracketed node list or a single node.
    fn parse_mf_node(&mut self, field: &Token) -> ParseResult<Vec<NodeId>> {
        if self.peek_kind()? != Some(TokenKind::OpenBracket) {
            return Ok(self.parse_node()?.into_iter().collect());
        }

        self.advance()?;
        let mut nodes = Vec::new();
        loop {
            if self.try_skip_statement()? {
                continue;
            }
            match self.peek_kind()? {
                None => return Err(self.eof(&format!("nodes of '{}'", field.text))),
                Some(TokenKind::CloseBracket) => {
                    self.advance()?;
                    break;
                }
                Some(TokenKind::Comma) => {
                    self.advance()?;
                }
                Some(_) => nodes.extend(self.parse_node()?),
            }
        }
        Ok(nodes)
    }

    // ------------------------------------------------------------------
    // Skipping
    // ------------------------------------------------------------------

    /// Consume the value of a field we do not interpret.
    ///
    /// Node values are still parsed so that any DEF inside them is registered.
    fn skip_value(&mut self, field: &Token) -> ParseResult<()> {
        let token = self.expect(&format!("value of '{}'", field.text))?;
        match token.kind {
            TokenKind::OpenBracket => self.skip_list(field),
            TokenKind::Number(_) => {
                while matches!(
                    self.peek_kind()?,
                    Some(TokenKind::Number(_)) | Some(TokenKind::Comma)
                ) {
                    self.advance()?;
                }
                Ok(())
            }
            TokenKind::String => Ok(()),
            TokenKind::Identifier if token.text == "TRUE" || token.text == "FALSE" => Ok(()),
            TokenKind::Identifier => {
                self.lookahead.push_front(token);
                self.parse_node().map(|_| ())
            }
            _ => Err(syntax(
                token.pos,
                format!("Expected a value for '{}', found {}", field.text, token.describe()),
            )),
        }
    }

    fn skip_list(&mut self, field: &Token) -> ParseResult<()> {
        loop {
            let token = self.expect(&format!("values of '{}'", field.text))?;
            match token.kind {
                TokenKind::CloseBracket => return Ok(()),
                TokenKind::Comma | TokenKind::Number(_) | TokenKind::String => {}
                TokenKind::Identifier if token.text == "TRUE" || token.text == "FALSE" => {}
                TokenKind::Identifier => {
                    self.lookahead.push_front(token);
                    self.parse_node()?;
                }
                _ => {
                    return Err(syntax(
                        token.pos,
                        format!("Unexpected {} in '{}'", token.describe(), field.text),
                    ))
                }
            }
        }
    }

    /// Consume the body of a node type we do not interpret.
    ///
    /// Script-style interface declarations (`field SFFloat x 1`,
    /// `eventIn SFTime t`) are accepted alongside ordinary fields.
    fn skip_unknown_node(&mut self, node_type: &str) -> ParseResult<()> {
        self.parse_fields(node_type, |p, field| {
            let has_value = match field.text.as_str() {
                "field" | "exposedField" => true,
                "eventIn" | "eventOut" => false,
                _ => return Ok(false),
            };
            p.expect_identifier(&format!("type of {} declaration", field.text))?;
            let name = p.expect_identifier(&format!("name of {} declaration", field.text))?;
            if has_value {
                p.skip_value(&name)?;
            }
            Ok(true)
        })
    }

    /// Skip the rest of a brace-delimited body whose `{` was consumed.
    fn skip_block(&mut self, start: SourcePos, node_type: &str) -> ParseResult<()> {
        let context = format!("body of {} starting at {}", node_type, start);
        let mut open = vec![TokenKind::CloseBrace];

        while let Some(closer) = open.last().cloned() {
            let token = self.expect(&context)?;
            match token.kind {
                TokenKind::OpenBrace => open.push(TokenKind::CloseBrace),
                TokenKind::OpenBracket => open.push(TokenKind::CloseBracket),
                TokenKind::CloseBrace | TokenKind::CloseBracket => {
                    if token.kind != closer {
                        return Err(syntax(
                            token.pos,
                            format!("Mismatched {} in {}", token.describe(), node_type),
                        ));
                    }
                    open.pop();
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Skip a bracketed interface list whose `[` was consumed.
    fn skip_brackets(&mut self, context: &str) -> ParseResult<()> {
        let mut depth = 1usize;
        while depth > 0 {
            let token = self.expect(context)?;
            match token.kind {
                TokenKind::OpenBracket => depth += 1,
                TokenKind::CloseBracket => depth -= 1,
                _ => {}
            }
        }
        Ok(())
    }

    /// Skip a `ROUTE`, `PROTO` or `EXTERNPROTO` statement if one is next.
    fn try_skip_statement(&mut self) -> ParseResult<bool> {
        let keyword = match self.peek()? {
            Some(token)
                if token.kind == TokenKind::Identifier
                    && matches!(token.text.as_str(), "ROUTE" | "PROTO" | "EXTERNPROTO") =>
            {
                token.text.clone()
            }
            _ => return Ok(false),
        };
        let start = self.expect(&keyword)?;

        match keyword.as_str() {
            "ROUTE" => {
                // ROUTE a.out TO b.in
                self.expect_identifier("ROUTE source node")?;
                self.expect_kind(TokenKind::Period, "'.' in ROUTE")?;
                self.expect_identifier("ROUTE source field")?;
                let to = self.expect_identifier("TO")?;
                if to.text != "TO" {
                    return Err(syntax(to.pos, format!("Expected TO in ROUTE, found {}", to.describe())));
                }
                self.expect_identifier("ROUTE target node")?;
                self.expect_kind(TokenKind::Period, "'.' in ROUTE")?;
                self.expect_identifier("ROUTE target field")?;
            }
            "PROTO" => {
                let name = self.expect_identifier("PROTO name")?;
                self.expect_kind(TokenKind::OpenBracket, "'[' after PROTO name")?;
                self.skip_brackets("PROTO interface")?;
                self.expect_kind(TokenKind::OpenBrace, "'{' for PROTO body")?;
                self.skip_block(start.pos, &format!("PROTO {}", name.text))?;
                log::info!("Skipping PROTO '{}' at {}", name.text, start.pos);
            }
            _ => {
                let name = self.expect_identifier("EXTERNPROTO name")?;
                self.expect_kind(TokenKind::OpenBracket, "'[' after EXTERNPROTO name")?;
                self.skip_brackets("EXTERNPROTO interface")?;
                let url = self.expect("EXTERNPROTO url")?;
                match url.kind {
                    TokenKind::String => {}
                    TokenKind::OpenBracket => self.skip_brackets("EXTERNPROTO url")?,
                    _ => {
                        return Err(syntax(
                            url.pos,
                            format!("Expected EXTERNPROTO url, found {}", url.describe()),
                        ))
                    }
                }
                log::info!("Skipping EXTERNPROTO '{}' at {}", name.text, start.pos);
            }
        }
        Ok(true)
    }
}

fn to_int(value: f64) -> Option<i32> {
    if value.fract() == 0.0 && value >= i32::MIN as f64 && value <= i32::MAX as f64 {
        Some(value as i32)
    } else {
        None
    }
}

/// Parse a VRML string into a node arena.
pub fn parse_vrml(content: &str) -> ParseResult<ParsedScene> {
    VrmlParser::new(content).parse()
}
