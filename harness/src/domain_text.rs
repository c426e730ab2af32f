//! Domain-file reader: parses a textual grounded epistemic-planning domain
//! into an `epistemic_kernel::domain::Domain`.
//!
//! Grounded on `original_source/src/parse/{Reader,BeliefFormulaParsed}.*`:
//! the original keeps an un-grounded "parsed" formula tree (names, not ids)
//! separate from the grounded `BeliefFormula`, and grounds it only once
//! every name has been declared. This module keeps the same two-stage
//! shape (`ParsedFormula` -> [`ground`]) rather than grounding while
//! parsing, so an undeclared-identifier error can be reported with the
//! offending name still attached.
//!
//! # Grammar
//!
//! ```text
//! domain      := decl decl decl block*
//! decl        := ("fluents" | "agents" | "actions") ":" name_list
//! block       := action_block | initial_block | goal_block
//!
//! action_block  := "action" NAME action_item* "end"
//! action_item   := "type" kind
//!                | "executability" formula
//!                | "effect" formula ["if" formula]
//!                | "fully" NAME ["if" formula]
//!                | "partially" NAME ["if" formula]
//! kind          := "ontic" | "sensing" | "announcement"
//!
//! initial_block := "initial" initial_item* "end"
//! initial_item   := "fact" formula
//!                 | "common" group ":" formula
//!                 | "ignorant" group ":" NAME ":" NAME
//!                 | "aware" group ":" NAME ":" NAME
//!
//! goal_block  := "goal" formula_list "end"
//!
//! formula     := or_formula
//! or_formula  := and_formula ("or" and_formula)*
//! and_formula := unary ("and" unary)*
//! unary       := "not" unary | atom
//! atom        := "true" | NAME
//!              | "B" "(" NAME "," formula ")"
//!              | ("E" | "C" | "D") "(" group "," formula ")"
//!              | "(" formula ")"
//! group       := NAME ("," NAME)*
//! ```
//!
//! `ignorant G : a : f` desugars to `C(G, B(a,f) or not B(a,f))` and
//! `aware G : a : f` to `C(G, not B(a,f) and not B(a, not f))` -- the two
//! initial-condition "edge removal" patterns spec.md §4.1 and §6 restrict
//! `initially` belief facts to, spelled as dedicated keywords instead of
//! asking the author to write the expansion out by hand.

use std::collections::BTreeMap;
use std::fmt;

use epistemic_kernel::action::{Action, ActionKind};
use epistemic_kernel::bitset::{Agent, Fluent, FluentsSet};
use epistemic_kernel::domain::Domain;
use epistemic_kernel::formula::{BeliefFormula, FluentFormula, Group};
use epistemic_kernel::grounder::GrounderBuilder;

/// Errors raised while lexing, parsing, or grounding a domain file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainTextError {
    Lex { detail: String },
    Parse { detail: String },
    UndeclaredFluent { name: String },
    UndeclaredAgent { name: String },
    UndeclaredAction { name: String },
    NonSingletonEffect { action: String },
    ActionTypeConflict { action: String },
    UnknownKind { found: String },
}

impl fmt::Display for DomainTextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex { detail } => write!(f, "lex error: {detail}"),
            Self::Parse { detail } => write!(f, "parse error: {detail}"),
            Self::UndeclaredFluent { name } => write!(f, "undeclared fluent {name:?}"),
            Self::UndeclaredAgent { name } => write!(f, "undeclared agent {name:?}"),
            Self::UndeclaredAction { name } => write!(f, "undeclared action {name:?}"),
            Self::NonSingletonEffect { action } => {
                write!(f, "action {action:?} has a non-singleton effect disjunction")
            }
            Self::ActionTypeConflict { action } => {
                write!(f, "action {action:?} declared with conflicting types")
            }
            Self::UnknownKind { found } => write!(f, "unknown action type {found:?}"),
        }
    }
}

impl std::error::Error for DomainTextError {}

impl From<DomainTextError> for crate::error::HarnessError {
    fn from(value: DomainTextError) -> Self {
        use crate::error::HarnessError;
        match value {
            DomainTextError::Lex { detail } | DomainTextError::Parse { detail } => {
                HarnessError::ArgumentParse { detail }
            }
            DomainTextError::UnknownKind { found } => HarnessError::ArgumentParse {
                detail: format!("unknown action type {found:?}"),
            },
            DomainTextError::UndeclaredFluent { name } => HarnessError::UndeclaredIdentifier {
                detail: format!("undeclared fluent {name:?}"),
            },
            DomainTextError::UndeclaredAgent { name } => HarnessError::UndeclaredIdentifier {
                detail: format!("undeclared agent {name:?}"),
            },
            DomainTextError::UndeclaredAction { name } => HarnessError::UndeclaredIdentifier {
                detail: format!("undeclared action {name:?}"),
            },
            DomainTextError::NonSingletonEffect { action } => {
                HarnessError::NonDeterminismUnsupported {
                    detail: format!("action {action:?} has a non-singleton effect disjunction"),
                }
            }
            DomainTextError::ActionTypeConflict { action } => {
                HarnessError::ActionTypeConflict { action }
            }
        }
    }
}

// ---------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Comma,
    Colon,
    LParen,
    RParen,
}

fn lex(source: &str) -> Result<Vec<Token>, DomainTextError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            ';' => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            ':' => {
                chars.next();
                tokens.push(Token::Colon);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            c if c.is_alphanumeric() || c == '_' || c == '-' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '-' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            other => {
                return Err(DomainTextError::Lex {
                    detail: format!("unexpected character {other:?}"),
                });
            }
        }
    }
    Ok(tokens)
}

// ---------------------------------------------------------------------
// Un-grounded (name-based) formula AST, mirroring `BeliefFormulaParsed`.
// ---------------------------------------------------------------------

#[derive(Debug, Clone)]
enum ParsedFormula {
    Top,
    Fluent(String),
    Not(Box<ParsedFormula>),
    And(Box<ParsedFormula>, Box<ParsedFormula>),
    Or(Box<ParsedFormula>, Box<ParsedFormula>),
    Believes(String, Box<ParsedFormula>),
    Everyone(Vec<String>, Box<ParsedFormula>),
    Common(Vec<String>, Box<ParsedFormula>),
    Distributed(Vec<String>, Box<ParsedFormula>),
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        self.pos += 1;
        tok
    }

    fn expect_ident(&mut self) -> Result<String, DomainTextError> {
        match self.advance() {
            Some(Token::Ident(s)) => Ok(s.clone()),
            other => Err(DomainTextError::Parse {
                detail: format!("expected identifier, found {other:?}"),
            }),
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), DomainTextError> {
        match self.advance() {
            Some(tok) if tok == expected => Ok(()),
            other => Err(DomainTextError::Parse {
                detail: format!("expected {expected:?}, found {other:?}"),
            }),
        }
    }

    fn peek_ident_is(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(s)) if s == word)
    }

    fn consume_ident_if(&mut self, word: &str) -> bool {
        if self.peek_ident_is(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_name_list(&mut self) -> Result<Vec<String>, DomainTextError> {
        let mut names = vec![self.expect_ident()?];
        while matches!(self.peek(), Some(Token::Comma)) {
            self.pos += 1;
            names.push(self.expect_ident()?);
        }
        Ok(names)
    }

    fn parse_group(&mut self) -> Result<Vec<String>, DomainTextError> {
        self.parse_name_list()
    }

    fn parse_formula(&mut self) -> Result<ParsedFormula, DomainTextError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<ParsedFormula, DomainTextError> {
        let mut lhs = self.parse_and()?;
        while self.consume_ident_if("or") {
            let rhs = self.parse_and()?;
            lhs = ParsedFormula::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<ParsedFormula, DomainTextError> {
        let mut lhs = self.parse_unary()?;
        while self.consume_ident_if("and") {
            let rhs = self.parse_unary()?;
            lhs = ParsedFormula::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<ParsedFormula, DomainTextError> {
        if self.consume_ident_if("not") {
            return Ok(ParsedFormula::Not(Box::new(self.parse_unary()?)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<ParsedFormula, DomainTextError> {
        match self.peek() {
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.parse_formula()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Ident(word)) if word == "true" => {
                self.pos += 1;
                Ok(ParsedFormula::Top)
            }
            Some(Token::Ident(word)) if word == "B" => {
                self.pos += 1;
                self.expect(&Token::LParen)?;
                let agent = self.expect_ident()?;
                self.expect(&Token::Comma)?;
                let phi = self.parse_formula()?;
                self.expect(&Token::RParen)?;
                Ok(ParsedFormula::Believes(agent, Box::new(phi)))
            }
            Some(Token::Ident(word)) if word == "E" || word == "C" || word == "D" => {
                let kind = word.clone();
                self.pos += 1;
                self.expect(&Token::LParen)?;
                let group = self.parse_group()?;
                self.expect(&Token::Comma)?;
                let phi = self.parse_formula()?;
                self.expect(&Token::RParen)?;
                Ok(match kind.as_str() {
                    "E" => ParsedFormula::Everyone(group, Box::new(phi)),
                    "C" => ParsedFormula::Common(group, Box::new(phi)),
                    _ => ParsedFormula::Distributed(group, Box::new(phi)),
                })
            }
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(ParsedFormula::Fluent(name))
            }
            other => Err(DomainTextError::Parse {
                detail: format!("expected formula, found {other:?}"),
            }),
        }
    }
}

/// Ground a [`ParsedFormula`] into a [`BeliefFormula`], failing on any
/// name not yet registered in `grounder`.
fn ground(
    formula: &ParsedFormula,
    grounder: &epistemic_kernel::grounder::Grounder,
) -> Result<BeliefFormula, DomainTextError> {
    match formula {
        ParsedFormula::Top => Ok(BeliefFormula::Top),
        ParsedFormula::Fluent(name) => {
            let id = grounder
                .fluent_id(name)
                .map_err(|_| DomainTextError::UndeclaredFluent { name: name.clone() })?;
            Ok(BeliefFormula::Fluent(Fluent::new(id, true)))
        }
        ParsedFormula::Not(inner) => {
            // Negation of a bare fluent reference normalizes to the
            // negated literal directly rather than wrapping in `Not`, so
            // downstream formula equality/ordering (which treats `Fluent`
            // specially) sees `not p` and `Fluent(p, negative)` the same
            // way a directly-authored negative literal would.
            if let ParsedFormula::Fluent(name) = inner.as_ref() {
                let id = grounder
                    .fluent_id(name)
                    .map_err(|_| DomainTextError::UndeclaredFluent { name: name.clone() })?;
                return Ok(BeliefFormula::Fluent(Fluent::new(id, false)));
            }
            Ok(BeliefFormula::not(ground(inner, grounder)?))
        }
        ParsedFormula::And(a, b) => Ok(BeliefFormula::and(vec![
            ground(a, grounder)?,
            ground(b, grounder)?,
        ])),
        ParsedFormula::Or(a, b) => Ok(BeliefFormula::or(vec![
            ground(a, grounder)?,
            ground(b, grounder)?,
        ])),
        ParsedFormula::Believes(agent, inner) => {
            let a = grounder
                .agent_id(agent)
                .map_err(|_| DomainTextError::UndeclaredAgent { name: agent.clone() })?;
            Ok(BeliefFormula::believes(a, ground(inner, grounder)?))
        }
        ParsedFormula::Everyone(group, inner) => {
            Ok(BeliefFormula::everyone(ground_group(group, grounder)?, ground(inner, grounder)?))
        }
        ParsedFormula::Common(group, inner) => {
            Ok(BeliefFormula::common(ground_group(group, grounder)?, ground(inner, grounder)?))
        }
        ParsedFormula::Distributed(group, inner) => Ok(BeliefFormula::distributed(
            ground_group(group, grounder)?,
            ground(inner, grounder)?,
        )),
    }
}

fn ground_group(
    names: &[String],
    grounder: &epistemic_kernel::grounder::Grounder,
) -> Result<Group, DomainTextError> {
    names
        .iter()
        .map(|name| {
            grounder
                .agent_id(name)
                .map_err(|_| DomainTextError::UndeclaredAgent { name: name.clone() })
        })
        .collect()
}

/// Ground a bare fluent name into a positive literal singleton
/// `FluentFormula`, used for `effect`/single-literal contexts where a
/// full belief formula would be the wrong shape.
fn ground_effect_literal(
    formula: &ParsedFormula,
    grounder: &epistemic_kernel::grounder::Grounder,
) -> Result<Fluent, DomainTextError> {
    match formula {
        ParsedFormula::Fluent(name) => {
            let id = grounder
                .fluent_id(name)
                .map_err(|_| DomainTextError::UndeclaredFluent { name: name.clone() })?;
            Ok(Fluent::new(id, true))
        }
        ParsedFormula::Not(inner) => {
            if let ParsedFormula::Fluent(name) = inner.as_ref() {
                let id = grounder
                    .fluent_id(name)
                    .map_err(|_| DomainTextError::UndeclaredFluent { name: name.clone() })?;
                return Ok(Fluent::new(id, false));
            }
            Err(DomainTextError::Parse {
                detail: "effect literal must be a (possibly negated) fluent name".to_string(),
            })
        }
        _ => Err(DomainTextError::Parse {
            detail: "effect literal must be a (possibly negated) fluent name".to_string(),
        }),
    }
}

// ---------------------------------------------------------------------
// Top-level domain parsing
// ---------------------------------------------------------------------

struct RawAction {
    name: String,
    kind: Option<ActionKind>,
    executability: Option<ParsedFormula>,
    effects: Vec<(ParsedFormula, Option<ParsedFormula>)>,
    fully: Vec<(String, Option<ParsedFormula>)>,
    partially: Vec<(String, Option<ParsedFormula>)>,
}

enum InitialItem {
    Fact(ParsedFormula),
    Common(Vec<String>, ParsedFormula),
    Ignorant(Vec<String>, String, String),
    Aware(Vec<String>, String, String),
}

struct RawDomain {
    fluents: Vec<String>,
    agents: Vec<String>,
    actions: Vec<String>,
    action_blocks: Vec<RawAction>,
    initial_items: Vec<InitialItem>,
    goal_conjuncts: Vec<ParsedFormula>,
}

fn parse_kind(word: &str) -> Result<ActionKind, DomainTextError> {
    match word {
        "ontic" => Ok(ActionKind::Ontic),
        "sensing" => Ok(ActionKind::Sensing),
        "announcement" => Ok(ActionKind::Announcement),
        other => Err(DomainTextError::UnknownKind {
            found: other.to_string(),
        }),
    }
}

fn parse_raw_domain(tokens: &[Token]) -> Result<RawDomain, DomainTextError> {
    let mut parser = Parser::new(tokens);

    let fluents = parse_decl(&mut parser, "fluents")?;
    let agents = parse_decl(&mut parser, "agents")?;
    let actions = parse_decl(&mut parser, "actions")?;

    let mut action_blocks = Vec::new();
    let mut initial_items = Vec::new();
    let mut goal_conjuncts = Vec::new();

    while parser.peek().is_some() {
        if parser.consume_ident_if("action") {
            action_blocks.push(parse_action_block(&mut parser)?);
        } else if parser.consume_ident_if("initial") {
            while !parser.peek_ident_is("end") {
                initial_items.push(parse_initial_item(&mut parser)?);
            }
            parser.pos += 1; // consume "end"
        } else if parser.consume_ident_if("goal") {
            while !parser.peek_ident_is("end") {
                goal_conjuncts.push(parser.parse_formula()?);
            }
            parser.pos += 1; // consume "end"
        } else {
            return Err(DomainTextError::Parse {
                detail: format!("expected a block keyword, found {:?}", parser.peek()),
            });
        }
    }

    Ok(RawDomain {
        fluents,
        agents,
        actions,
        action_blocks,
        initial_items,
        goal_conjuncts,
    })
}

fn parse_decl(parser: &mut Parser<'_>, keyword: &str) -> Result<Vec<String>, DomainTextError> {
    if !parser.consume_ident_if(keyword) {
        return Err(DomainTextError::Parse {
            detail: format!("expected declaration {keyword:?}, found {:?}", parser.peek()),
        });
    }
    parser.expect(&Token::Colon)?;
    parser.parse_name_list()
}

fn parse_action_block(parser: &mut Parser<'_>) -> Result<RawAction, DomainTextError> {
    let name = parser.expect_ident()?;
    let mut action = RawAction {
        name,
        kind: None,
        executability: None,
        effects: Vec::new(),
        fully: Vec::new(),
        partially: Vec::new(),
    };
    while !parser.peek_ident_is("end") {
        if parser.consume_ident_if("type") {
            let word = parser.expect_ident()?;
            action.kind = Some(parse_kind(&word)?);
        } else if parser.consume_ident_if("executability") {
            action.executability = Some(parser.parse_formula()?);
        } else if parser.consume_ident_if("effect") {
            let effect = parser.parse_formula()?;
            let guard = if parser.consume_ident_if("if") {
                Some(parser.parse_formula()?)
            } else {
                None
            };
            action.effects.push((effect, guard));
        } else if parser.consume_ident_if("fully") {
            let agent = parser.expect_ident()?;
            let guard = if parser.consume_ident_if("if") {
                Some(parser.parse_formula()?)
            } else {
                None
            };
            action.fully.push((agent, guard));
        } else if parser.consume_ident_if("partially") {
            let agent = parser.expect_ident()?;
            let guard = if parser.consume_ident_if("if") {
                Some(parser.parse_formula()?)
            } else {
                None
            };
            action.partially.push((agent, guard));
        } else {
            return Err(DomainTextError::Parse {
                detail: format!("unexpected action item {:?}", parser.peek()),
            });
        }
    }
    parser.pos += 1; // consume "end"
    Ok(action)
}

fn parse_initial_item(parser: &mut Parser<'_>) -> Result<InitialItem, DomainTextError> {
    if parser.consume_ident_if("fact") {
        return Ok(InitialItem::Fact(parser.parse_formula()?));
    }
    if parser.consume_ident_if("common") {
        let group = parser.parse_group()?;
        parser.expect(&Token::Colon)?;
        let phi = parser.parse_formula()?;
        return Ok(InitialItem::Common(group, phi));
    }
    if parser.consume_ident_if("ignorant") {
        let group = parser.parse_group()?;
        parser.expect(&Token::Colon)?;
        let agent = parser.expect_ident()?;
        parser.expect(&Token::Colon)?;
        let fluent = parser.expect_ident()?;
        return Ok(InitialItem::Ignorant(group, agent, fluent));
    }
    if parser.consume_ident_if("aware") {
        let group = parser.parse_group()?;
        parser.expect(&Token::Colon)?;
        let agent = parser.expect_ident()?;
        parser.expect(&Token::Colon)?;
        let fluent = parser.expect_ident()?;
        return Ok(InitialItem::Aware(group, agent, fluent));
    }
    Err(DomainTextError::Parse {
        detail: format!("unexpected initial item {:?}", parser.peek()),
    })
}

/// Parse `source` and build a fully-grounded [`Domain`], plus the fluent
/// count needed for [`epistemic_kernel::state::KripkeState::build_initial`].
///
/// # Errors
///
/// Returns [`DomainTextError`] for any lex/parse/grounding failure,
/// including an action whose type never resolves per spec.md's REDESIGN
/// FLAG (the action's `type` is set by the *first* informative
/// proposition; `fully`/`partially` guards only augment observability and
/// are accepted on ontic actions exactly as on sensing/announcement
/// actions -- an action left with no declared `type` at all is rejected as
/// a [`DomainTextError::ActionTypeConflict`]).
pub fn parse_domain(source: &str) -> Result<(Domain, usize), DomainTextError> {
    let tokens = lex(source)?;
    let raw = parse_raw_domain(&tokens)?;

    let mut builder = GrounderBuilder::new();
    for f in &raw.fluents {
        builder.register_fluent(f);
    }
    for a in &raw.agents {
        builder.register_agent(a);
    }
    for a in &raw.actions {
        builder.register_action(a);
    }
    let grounder = builder.build();

    let goal_parts: Result<Vec<BeliefFormula>, DomainTextError> =
        raw.goal_conjuncts.iter().map(|f| ground(f, &grounder)).collect();
    let goal = BeliefFormula::and(goal_parts?);

    let mut domain = Domain::new(grounder, goal, u16::try_from(raw.actions.len() * 4 + 16).unwrap_or(u16::MAX));

    for item in &raw.initial_items {
        match item {
            InitialItem::Fact(f) => domain.initial.push(ground(f, &domain.grounder)?),
            InitialItem::Common(group, f) => {
                let g = ground_group(group, &domain.grounder)?;
                domain.initial.push(BeliefFormula::common(g, ground(f, &domain.grounder)?));
            }
            InitialItem::Ignorant(group, agent, fluent) => {
                let g = ground_group(group, &domain.grounder)?;
                let a = domain
                    .grounder
                    .agent_id(agent)
                    .map_err(|_| DomainTextError::UndeclaredAgent { name: agent.clone() })?;
                let id = domain
                    .grounder
                    .fluent_id(fluent)
                    .map_err(|_| DomainTextError::UndeclaredFluent { name: fluent.clone() })?;
                let phi = BeliefFormula::Fluent(Fluent::new(id, true));
                let believes_phi = BeliefFormula::believes(a, phi.clone());
                let believes_not_phi = BeliefFormula::believes(a, BeliefFormula::not(phi));
                domain
                    .initial
                    .push(BeliefFormula::common(g, BeliefFormula::or(vec![believes_phi, believes_not_phi])));
            }
            InitialItem::Aware(group, agent, fluent) => {
                let g = ground_group(group, &domain.grounder)?;
                let a = domain
                    .grounder
                    .agent_id(agent)
                    .map_err(|_| DomainTextError::UndeclaredAgent { name: agent.clone() })?;
                let id = domain
                    .grounder
                    .fluent_id(fluent)
                    .map_err(|_| DomainTextError::UndeclaredFluent { name: fluent.clone() })?;
                let phi = BeliefFormula::Fluent(Fluent::new(id, true));
                let not_believes_phi =
                    BeliefFormula::not(BeliefFormula::believes(a, phi.clone()));
                let not_believes_not_phi =
                    BeliefFormula::not(BeliefFormula::believes(a, BeliefFormula::not(phi)));
                domain.initial.push(BeliefFormula::common(
                    g,
                    BeliefFormula::and(vec![not_believes_phi, not_believes_not_phi]),
                ));
            }
        }
    }

    for raw_action in &raw.action_blocks {
        let id = domain
            .grounder
            .action_id(&raw_action.name)
            .map_err(|_| DomainTextError::UndeclaredAction {
                name: raw_action.name.clone(),
            })?;

        let declared_kind = raw_action.kind.unwrap_or(ActionKind::NotSet);

        // spec.md REDESIGN FLAG: `type` is set by the first informative
        // proposition; later OBSERVANCE/EXECUTABILITY propositions only
        // augment observability/executability and never change or reset
        // `kind`. An ontic action partitions agents into `fully` and
        // `oblivious` exactly like a sensing/announcement action (spec.md
        // §4.1: "Let `a` be ontic. Partition agents into `fully = {a :
        // guard(a) holds}` and `oblivious`") -- the parenthetical "ontic
        // actions have no partially-observant agents" means an ontic
        // action has no *partial* role, not that it rejects observance
        // guards outright, so `fully`/`partially` guards are accepted here
        // regardless of `declared_kind`. The only genuine conflict is an
        // unresolved informative type.
        if declared_kind == ActionKind::NotSet {
            return Err(DomainTextError::ActionTypeConflict {
                action: raw_action.name.clone(),
            });
        }

        let executability = match &raw_action.executability {
            Some(f) => ground(f, &domain.grounder)?,
            None => BeliefFormula::Top,
        };
        let mut action = Action::new(id, declared_kind, executability);

        for (effect, guard) in &raw_action.effects {
            let literal = ground_effect_literal(effect, &domain.grounder)?;
            let set = FluentsSet::try_from_literals([literal]).ok_or_else(|| {
                DomainTextError::NonSingletonEffect {
                    action: raw_action.name.clone(),
                }
            })?;
            let formula = FluentFormula::from_singleton(set);
            let guard = match guard {
                Some(g) => ground(g, &domain.grounder)?,
                None => BeliefFormula::Top,
            };
            action.effects.insert(formula, guard);
        }
        for (agent, guard) in &raw_action.fully {
            let a = domain
                .grounder
                .agent_id(agent)
                .map_err(|_| DomainTextError::UndeclaredAgent { name: agent.clone() })?;
            let guard = match guard {
                Some(g) => ground(g, &domain.grounder)?,
                None => BeliefFormula::Top,
            };
            action.fully_observants.insert(a, guard);
        }
        for (agent, guard) in &raw_action.partially {
            let a = domain
                .grounder
                .agent_id(agent)
                .map_err(|_| DomainTextError::UndeclaredAgent { name: agent.clone() })?;
            let guard = match guard {
                Some(g) => ground(g, &domain.grounder)?,
                None => BeliefFormula::Top,
            };
            action.partially_observants.insert(a, guard);
        }

        domain.actions.insert(id, action);
    }

    domain.validate().map_err(|err| match err {
        epistemic_kernel::error::KernelError::ConflictingActionType { action } => {
            DomainTextError::ActionTypeConflict { action }
        }
        other => DomainTextError::Parse {
            detail: other.to_string(),
        },
    })?;

    let fluent_count = raw.fluents.len();
    Ok((domain, fluent_count))
}

/// Every agent mentioned in the domain's effects/executability/goal/
/// observability, used by [`crate::gnn`]/[`crate::dataset`] to size a
/// `Vec<Agent>` for bisimulation encoding without re-parsing.
#[must_use]
pub fn all_agents(domain: &Domain) -> Vec<Agent> {
    domain.agents().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const COIN_TOSS: &str = "
        fluents: heads
        agents: a
        actions: look

        action look
          type sensing
          executability true
          fully a
        end

        initial
          ignorant a : a : heads
        end

        goal
          B a heads or B a not heads
        end
    ";

    #[test]
    fn parses_coin_toss_domain() {
        let (domain, fluent_count) = parse_domain(COIN_TOSS).unwrap();
        assert_eq!(fluent_count, 1);
        assert_eq!(domain.actions.len(), 1);
        let action_id = domain.grounder.action_id("look").unwrap();
        let action = domain.action(action_id).unwrap();
        assert_eq!(action.kind, ActionKind::Sensing);
        assert_eq!(action.fully_observants.len(), 1);
    }

    #[test]
    fn accepts_ontic_action_with_fully_observance() {
        let source = "
            fluents: p
            agents: a
            actions: act
            action act
              type ontic
              effect p
              fully a
            end
            initial
            end
            goal
              p
            end
        ";
        let (domain, _) = parse_domain(source).unwrap();
        let action_id = domain.grounder.action_id("act").unwrap();
        let action = domain.action(action_id).unwrap();
        assert_eq!(action.kind, ActionKind::Ontic);
        assert_eq!(action.fully_observants.len(), 1);
    }

    #[test]
    fn rejects_undeclared_fluent() {
        let source = "
            fluents: p
            agents: a
            actions: act
            action act
              type ontic
              effect q
            end
            initial
            end
            goal
              p
            end
        ";
        assert!(matches!(
            parse_domain(source),
            Err(DomainTextError::UndeclaredFluent { .. })
        ));
    }

    #[test]
    fn common_and_aware_initial_items_parse() {
        let source = "
            fluents: p, q
            agents: a, b
            actions: act
            action act
              type ontic
              effect p
            end
            initial
              common a, b : p or not p
              aware a, b : a : q
            end
            goal
              p
            end
        ";
        let (domain, _) = parse_domain(source).unwrap();
        assert_eq!(domain.initial.belief_facts.len(), 2);
    }

    #[test]
    fn two_agent_announcement_domain_from_spec_scenario_2() {
        let source = "
            fluents: p
            agents: a, b
            actions: tell_a

            action tell_a
              type announcement
              executability true
              fully a
            end

            initial
              fact p
            end

            goal
              B a p
            end
        ";
        let (domain, fluent_count) = parse_domain(source).unwrap();
        assert_eq!(fluent_count, 1);
        let action_id = domain.grounder.action_id("tell_a").unwrap();
        let action = domain.action(action_id).unwrap();
        assert_eq!(action.kind, ActionKind::Announcement);
    }
}
