//! Resolution engine: walks the production graph from a target item down to
//! raw materials.
//!
//! # Algorithm
//!
//! For a canonical item `id`, a real quantity `q`, and the set `P` of items on
//! the current descent path:
//!
//! 1. `id ∈ P` -- a cycle. `{id: q}` is returned as a raw contribution.
//! 2. A memo hit (totals-only runs) -- the per-unit vector scaled by `q`.
//! 3. No selected recipe -- a raw leaf, `{id: q}`.
//! 4. Otherwise `multiplier = q / output_count`; every ingredient is resolved
//!    with `count * multiplier` and `P ∪ {id}`, and totals are summed. When
//!    steps are requested, the parent step is recorded before any child.
//! 5. The per-unit vector (`totals / q`) is memoized once.
//!
//! # Memo and step traces
//!
//! The memo only short-circuits runs that do not record steps. When steps
//! are requested the engine always recurses (still writing the memo), so a
//! warm memo never hides a subtree from the trace.
//!
//! # Path set
//!
//! The recursive traversal threads a parent-linked [`Ancestry`] through the
//! call stack, so sibling branches never see each other's additions. The
//! iterative traversal keeps the same path as its explicit frame stack.
//! Both produce identical results.

use crate::catalog::Catalog;
use crate::id::ItemId;
use crate::recipe::{RecipeKind, RecipeRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned for malformed requests. Cycles, unknown items, and
/// unparseable recipes are never errors.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ResolveError {
    #[error("invalid quantity {quantity} for {item}: must be finite and non-negative")]
    InvalidQuantity { item: ItemId, quantity: f64 },
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How the engine walks the production graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Traversal {
    /// Plain recursion; depth bounded by the production graph depth.
    #[default]
    Recursive,
    /// Explicit frame stack; safe for arbitrarily deep packs.
    Iterative,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Raw-material totals keyed by item; iteration is sorted by item id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialTotals(BTreeMap<ItemId, f64>);

impl MaterialTotals {
    pub fn single(item: ItemId, quantity: f64) -> Self {
        let mut totals = Self::default();
        totals.add(item, quantity);
        totals
    }

    pub fn add(&mut self, item: ItemId, quantity: f64) {
        *self.0.entry(item).or_insert(0.0) += quantity;
    }

    /// Sum another vector into this one.
    pub fn absorb(&mut self, other: MaterialTotals) {
        for (item, quantity) in other.0 {
            self.add(item, quantity);
        }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self(self.0.iter().map(|(k, v)| (k.clone(), v * factor)).collect())
    }

    pub fn divided(&self, divisor: f64) -> Self {
        Self(self.0.iter().map(|(k, v)| (k.clone(), v / divisor)).collect())
    }

    pub fn get(&self, item: &str) -> Option<f64> {
        self.0.get(item).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, f64)> {
        self.0.iter().map(|(k, v)| (k, *v))
    }

    /// Consume into a list sorted lexicographically by item id.
    pub fn into_amounts(self) -> Vec<MaterialAmount> {
        self.0
            .into_iter()
            .map(|(item, count)| MaterialAmount { item, count })
            .collect()
    }
}

/// An item and a real-valued quantity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialAmount {
    pub item: ItemId,
    pub count: f64,
}

/// One production step of a bill of materials.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionStep {
    pub item: ItemId,
    pub count: f64,
    pub kind: RecipeKind,
    pub ingredients: Vec<MaterialAmount>,
    /// The recipe was a fallback, so this step is an approximation.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub synthetic: bool,
}

/// Raw output of [`Engine::resolve`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub totals: MaterialTotals,
    /// Pre-order (parent before children); empty unless steps were requested.
    pub steps: Vec<ProductionStep>,
    /// Items at which a cycle was cut, in encounter order.
    pub cycles: Vec<ItemId>,
}

/// A bill of materials for `quantity` units of `target`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bom {
    pub target: ItemId,
    pub quantity: f64,
    /// Sorted lexicographically by item id.
    pub raw_materials: Vec<MaterialAmount>,
    pub steps: Vec<ProductionStep>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cycles: Vec<ItemId>,
}

impl Bom {
    pub fn raw_material(&self, item: &str) -> Option<f64> {
        self.raw_materials
            .iter()
            .find(|m| m.item.as_str() == item)
            .map(|m| m.count)
    }

    /// True if any step used a fallback recipe.
    pub fn has_approximations(&self) -> bool {
        self.steps.iter().any(|s| s.synthetic)
    }
}

// ---------------------------------------------------------------------------
// Traversal state
// ---------------------------------------------------------------------------

/// Persistent path set: each node points at its parent on the call stack.
struct Ancestry<'p> {
    item: &'p ItemId,
    parent: Option<&'p Ancestry<'p>>,
}

impl Ancestry<'_> {
    fn contains(&self, item: &ItemId) -> bool {
        let mut node = Some(self);
        while let Some(current) = node {
            if current.item == item {
                return true;
            }
            node = current.parent;
        }
        false
    }
}

/// Per-call collector for steps and cycle cuts.
struct Trace {
    steps: Option<Vec<ProductionStep>>,
    cycles: Vec<ItemId>,
}

impl Trace {
    fn new(with_steps: bool) -> Self {
        Self {
            steps: with_steps.then(Vec::new),
            cycles: Vec::new(),
        }
    }

    fn records_steps(&self) -> bool {
        self.steps.is_some()
    }

    fn record_step(&mut self, recipe: &RecipeRecord, quantity: f64, multiplier: f64) {
        if let Some(steps) = self.steps.as_mut() {
            steps.push(ProductionStep {
                item: recipe.output.clone(),
                count: quantity,
                kind: recipe.kind.clone(),
                ingredients: recipe
                    .ingredients
                    .iter()
                    .map(|entry| MaterialAmount {
                        item: entry.item.clone(),
                        count: f64::from(entry.count) * multiplier,
                    })
                    .collect(),
                synthetic: recipe.synthetic,
            });
        }
    }
}

/// A recipe node whose ingredients are being resolved.
struct Frame<'c> {
    item: ItemId,
    quantity: f64,
    recipe: &'c RecipeRecord,
    multiplier: f64,
    next: usize,
    totals: MaterialTotals,
}

enum Visit<'c> {
    Leaf(MaterialTotals),
    Expand(Frame<'c>),
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// One resolution run over a shared [`Catalog`].
///
/// The memo belongs to this engine and is dropped with it; create one engine
/// per request and never share it between threads.
pub struct Engine<'c> {
    catalog: &'c Catalog,
    traversal: Traversal,
    memo: HashMap<ItemId, MaterialTotals>,
}

impl<'c> Engine<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            traversal: Traversal::default(),
            memo: HashMap::new(),
        }
    }

    pub fn with_traversal(mut self, traversal: Traversal) -> Self {
        self.traversal = traversal;
        self
    }

    pub fn traversal(&self) -> Traversal {
        self.traversal
    }

    /// Memoized per-unit vector for an item, if computed in this run.
    pub fn memoized(&self, item: &str) -> Option<&MaterialTotals> {
        self.memo.get(item)
    }

    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    /// Resolve `quantity` units of `item` (canonicalized first).
    pub fn resolve(
        &mut self,
        item: &str,
        quantity: f64,
        with_steps: bool,
    ) -> Result<Resolution, ResolveError> {
        let id = self.catalog.canonicalize(item);
        self.resolve_id(&id, quantity, with_steps)
    }

    /// Full bill of materials with the step trace.
    pub fn analyze(&mut self, item: &str, quantity: f64) -> Result<Bom, ResolveError> {
        self.bom(item, quantity, true)
    }

    /// Bill of materials without steps; memo hits short-circuit.
    pub fn analyze_totals(&mut self, item: &str, quantity: f64) -> Result<Bom, ResolveError> {
        self.bom(item, quantity, false)
    }

    fn bom(&mut self, item: &str, quantity: f64, with_steps: bool) -> Result<Bom, ResolveError> {
        let target = self.catalog.canonicalize(item);
        let resolution = self.resolve_id(&target, quantity, with_steps)?;
        Ok(Bom {
            target,
            quantity,
            raw_materials: resolution.totals.into_amounts(),
            steps: resolution.steps,
            cycles: resolution.cycles,
        })
    }

    fn resolve_id(
        &mut self,
        id: &ItemId,
        quantity: f64,
        with_steps: bool,
    ) -> Result<Resolution, ResolveError> {
        if !quantity.is_finite() || quantity < 0.0 {
            return Err(ResolveError::InvalidQuantity {
                item: id.clone(),
                quantity,
            });
        }

        let mut trace = Trace::new(with_steps);
        let totals = match self.traversal {
            Traversal::Recursive => self.descend(id, quantity, None, &mut trace),
            Traversal::Iterative => self.descend_iterative(id, quantity, &mut trace),
        };

        Ok(Resolution {
            totals,
            steps: trace.steps.unwrap_or_default(),
            cycles: trace.cycles,
        })
    }

    /// Steps 1-4 for a single node: either a finished leaf contribution or a
    /// frame whose ingredients still need resolving.
    fn enter(&mut self, item: &ItemId, quantity: f64, on_path: bool, trace: &mut Trace) -> Visit<'c> {
        if on_path {
            tracing::debug!(%item, quantity, "cycle detected; treating as raw material");
            trace.cycles.push(item.clone());
            return Visit::Leaf(MaterialTotals::single(item.clone(), quantity));
        }

        if !trace.records_steps() {
            if let Some(unit) = self.memo.get(item) {
                return Visit::Leaf(unit.scaled(quantity));
            }
        }

        let catalog = self.catalog;
        let Some(recipe) = catalog.recipes().get(item.as_str()) else {
            return Visit::Leaf(MaterialTotals::single(item.clone(), quantity));
        };

        let multiplier = quantity / f64::from(recipe.output_count);
        trace.record_step(recipe, quantity, multiplier);

        Visit::Expand(Frame {
            item: item.clone(),
            quantity,
            recipe,
            multiplier,
            next: 0,
            totals: MaterialTotals::default(),
        })
    }

    /// Step 5: store the per-unit vector once.
    fn remember(&mut self, item: &ItemId, totals: &MaterialTotals, quantity: f64) {
        if quantity > 0.0 && !self.memo.contains_key(item) {
            self.memo.insert(item.clone(), totals.divided(quantity));
        }
    }

    fn descend(
        &mut self,
        item: &ItemId,
        quantity: f64,
        path: Option<&Ancestry<'_>>,
        trace: &mut Trace,
    ) -> MaterialTotals {
        let on_path = path.is_some_and(|p| p.contains(item));
        match self.enter(item, quantity, on_path, trace) {
            Visit::Leaf(totals) => totals,
            Visit::Expand(mut frame) => {
                let here = Ancestry { item, parent: path };
                let recipe = frame.recipe;
                for entry in &recipe.ingredients {
                    let needed = f64::from(entry.count) * frame.multiplier;
                    let sub = self.descend(&entry.item, needed, Some(&here), trace);
                    frame.totals.absorb(sub);
                }
                self.remember(&frame.item, &frame.totals, frame.quantity);
                frame.totals
            }
        }
    }

    fn descend_iterative(&mut self, root: &ItemId, quantity: f64, trace: &mut Trace) -> MaterialTotals {
        let mut stack: Vec<Frame<'c>> = Vec::new();
        let mut path: HashSet<ItemId> = HashSet::new();

        match self.enter(root, quantity, false, trace) {
            Visit::Leaf(totals) => return totals,
            Visit::Expand(frame) => {
                path.insert(frame.item.clone());
                stack.push(frame);
            }
        }

        while let Some(top) = stack.last_mut() {
            let recipe = top.recipe;
            if let Some(entry) = recipe.ingredients.get(top.next) {
                top.next += 1;
                let needed = f64::from(entry.count) * top.multiplier;
                let on_path = path.contains(&entry.item);
                match self.enter(&entry.item, needed, on_path, trace) {
                    Visit::Leaf(totals) => top.totals.absorb(totals),
                    Visit::Expand(frame) => {
                        path.insert(frame.item.clone());
                        stack.push(frame);
                    }
                }
                continue;
            }

            let Some(done) = stack.pop() else { break };
            path.remove(&done.item);
            self.remember(&done.item, &done.totals, done.quantity);
            match stack.last_mut() {
                Some(parent) => parent.totals.absorb(done.totals),
                None => return done.totals,
            }
        }

        MaterialTotals::default()
    }
}
