use super::expression::parse_const_expr;
use super::token_stream::TokenStream;
use super::ParserError;
use crate::lexer::{KeywordKind, PunctuatorKind, TokenKind};
use log::debug;
use regmap::syntax::*;
use regmap::{NodeKind, PropertyValue};

/// Recursive descent parser producing the elaborator's syntax tree
pub struct RdlParser<'t, 'source> {
	stream: TokenStream<'t, 'source>,
}

fn component_kind(keyword: KeywordKind) -> Option<NodeKind> {
	match keyword {
		KeywordKind::Addrmap => Some(NodeKind::Addrmap),
		KeywordKind::Regfile => Some(NodeKind::Regfile),
		KeywordKind::Reg => Some(NodeKind::Reg),
		KeywordKind::Field => Some(NodeKind::Field),
		KeywordKind::Mem => Some(NodeKind::Mem),
		_ => None,
	}
}

impl<'t, 'source> RdlParser<'t, 'source> {
	pub fn new(stream: TokenStream<'t, 'source>) -> Self {
		Self { stream }
	}

	/// Parses the whole file
	pub fn parse_root(&mut self) -> Result<Root, ParserError> {
		let mut root = Root::default();
		while !self.stream.is_at_end() {
			root.items.push(self.parse_body_item()?);
		}
		debug!("Parsed {} root items", root.items.len());
		Ok(root)
	}

	fn parse_body_item(&mut self) -> Result<BodyItem, ParserError> {
		match self.stream.peek() {
			Some(TokenKind::Keyword(KeywordKind::Default)) => {
				self.stream.advance();
				Ok(BodyItem::Default(self.parse_property()?))
			},
			Some(TokenKind::Keyword(KeywordKind::External | KeywordKind::Internal)) => {
				let external = self.stream.is_keyword(KeywordKind::External);
				self.stream.advance();
				self.parse_component_or_instances(Some(external))
			},
			Some(TokenKind::Keyword(_)) => self.parse_component_or_instances(None),
			Some(TokenKind::Id(_)) => match self.stream.peek_nth(1) {
				Some(TokenKind::Id(_)) => Ok(BodyItem::Instances(self.parse_instance_stmt(None)?)),
				Some(TokenKind::Punctuator(PunctuatorKind::Dot | PunctuatorKind::Arrow)) => {
					self.parse_dynamic_assignment()
				},
				_ => Ok(BodyItem::Property(self.parse_property()?)),
			},
			_ => Err(self.stream.error("component, instance or property assignment")),
		}
	}

	/// Everything that may follow an optional `external`/`internal` modifier
	fn parse_component_or_instances(&mut self, external: Option<bool>) -> Result<BodyItem, ParserError> {
		match self.stream.peek() {
			Some(TokenKind::Keyword(keyword)) if component_kind(*keyword).is_some() => {
				self.parse_component(external)
			},
			Some(TokenKind::Keyword(KeywordKind::Alias)) | Some(TokenKind::Id(_)) => {
				Ok(BodyItem::Instances(self.parse_instance_stmt(external)?))
			},
			_ => Err(self.stream.error("component type")),
		}
	}

	/// `kind [name] { body } [instances];`
	fn parse_component(&mut self, external: Option<bool>) -> Result<BodyItem, ParserError> {
		let pos = self.stream.pos();
		let kind = match self.stream.advance().map(|t| &t.kind) {
			Some(TokenKind::Keyword(keyword)) => component_kind(*keyword),
			_ => None,
		}
		.ok_or_else(|| ParserError::unexpected_token("component type", self.stream.last_span()))?;

		let name = match self.stream.peek() {
			Some(TokenKind::Id(name)) => {
				self.stream.advance();
				Some(*name)
			},
			_ => None,
		};

		let mut def = ComponentDef::new(kind, name, pos);
		self.stream.expect_punct(PunctuatorKind::LBrace)?;
		while !self.stream.eat_punct(PunctuatorKind::RBrace) {
			if self.stream.is_at_end() {
				return Err(self.stream.error("'}'"));
			}
			def.items.push(self.parse_body_item()?);
		}

		if name.is_some() && external.is_none() && self.stream.eat_punct(PunctuatorKind::Semicolon) {
			return Ok(BodyItem::Definition(def));
		}

		let instances = self.parse_instance_list()?;
		let mut stmt = InstanceStmt::anonymous(def, instances);
		stmt.external = external;
		Ok(BodyItem::Instances(stmt))
	}

	/// `[alias primary] type_name instances;`
	fn parse_instance_stmt(&mut self, external: Option<bool>) -> Result<InstanceStmt, ParserError> {
		let alias_of = match self.stream.eat_keyword(KeywordKind::Alias) {
			true => Some(self.stream.expect_id("name of the aliased register")?.0.to_string()),
			false => None,
		};

		let pos = self.stream.pos();
		let (type_name, _) = self.stream.expect_id("type name")?;
		let instances = self.parse_instance_list()?;

		let mut stmt = InstanceStmt::named(type_name, pos, instances);
		stmt.alias_of = alias_of;
		stmt.external = external;
		Ok(stmt)
	}

	/// `instance {, instance} ;`
	fn parse_instance_list(&mut self) -> Result<Vec<InstanceSpec>, ParserError> {
		let mut instances = vec![self.parse_instance()?];
		while self.stream.eat_punct(PunctuatorKind::Comma) {
			instances.push(self.parse_instance()?);
		}
		self.stream.expect_punct(PunctuatorKind::Semicolon)?;
		Ok(instances)
	}

	/// `name {[expr[:expr]]} [= expr] [@ expr] [+= expr] [%= expr]`
	fn parse_instance(&mut self) -> Result<InstanceSpec, ParserError> {
		let pos = self.stream.pos();
		let (name, _) = self.stream.expect_id("instance name")?;
		let mut spec = InstanceSpec::new(name, pos);

		while self.stream.eat_punct(PunctuatorKind::LBracket) {
			let first = parse_const_expr(&mut self.stream)?.to_u64()?;
			let suffix = match self.stream.eat_punct(PunctuatorKind::Colon) {
				true => ArraySuffix::Range(first, parse_const_expr(&mut self.stream)?.to_u64()?),
				false => ArraySuffix::Count(first),
			};
			self.stream.expect_punct(PunctuatorKind::RBracket)?;
			spec.suffixes.push(suffix);
		}

		if self.stream.eat_punct(PunctuatorKind::Assignment) {
			spec.reset = Some(parse_const_expr(&mut self.stream)?.to_i64()?);
		}
		if self.stream.eat_punct(PunctuatorKind::At) {
			spec.address = Some(parse_const_expr(&mut self.stream)?.to_u64()?);
		}
		if self.stream.eat_punct(PunctuatorKind::AssignmentPlus) {
			spec.stride = Some(parse_const_expr(&mut self.stream)?.to_u64()?);
		}
		if self.stream.eat_punct(PunctuatorKind::AssignmentModulo) {
			spec.alignment = Some(parse_const_expr(&mut self.stream)?.to_u64()?);
		}
		Ok(spec)
	}

	/// `name [= value];`
	fn parse_property(&mut self) -> Result<PropertyAssignment, ParserError> {
		let pos = self.stream.pos();
		let (name, _) = self.stream.expect_id("property name")?;
		let value = match self.stream.eat_punct(PunctuatorKind::Assignment) {
			true => self.parse_value()?,
			false => PropertyValue::Boolean(true),
		};
		self.stream.expect_punct(PunctuatorKind::Semicolon)?;
		Ok(PropertyAssignment::new(name, value, pos))
	}

	/// `a.b.c->prop [= value];`
	fn parse_dynamic_assignment(&mut self) -> Result<BodyItem, ParserError> {
		let mut path = vec![self.stream.expect_id("instance name")?.0.to_string()];
		while self.stream.eat_punct(PunctuatorKind::Dot) {
			path.push(self.stream.expect_id("instance name")?.0.to_string());
		}
		self.stream.expect_punct(PunctuatorKind::Arrow)?;
		let property = self.parse_property()?;
		Ok(BodyItem::Dynamic(DynamicAssignment { path, property }))
	}

	fn parse_value(&mut self) -> Result<PropertyValue, ParserError> {
		let value = match self.stream.peek() {
			Some(TokenKind::Boolean(value)) => PropertyValue::Boolean(*value),
			Some(TokenKind::String(value)) => PropertyValue::String(value.clone()),
			Some(TokenKind::Id(name)) => PropertyValue::Enum(name.to_string()),
			_ => return Ok(PropertyValue::Integer(parse_const_expr(&mut self.stream)?.to_i64()?)),
		};
		self.stream.advance();
		Ok(value)
	}
}
