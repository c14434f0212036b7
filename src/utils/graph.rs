use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Graph structure:
/// A HashMap from each node to the HashSet of nodes connected to it, plus the
/// order in which nodes were first added.
///
/// Edges are undirected and stored on both endpoints. Self-loops are never stored.
#[derive(Clone, Debug)]
pub struct Graph<T: Hash + Eq> {
  adj: HashMap<T, HashSet<T>>,
  order: Vec<T>,
}

impl<T: Hash + Eq + Clone> Graph<T> {
  pub fn new() -> Self {
    Graph {
      adj: HashMap::new(),
      order: Vec::new(),
    }
  }

  /// Return the neighbors of a node
  ///
  /// # Return
  /// If the node does not exist, return None
  /// If there is no neighbor for this node, return an empty HashSet
  pub fn neighbors(&self, node: &T) -> Option<&HashSet<T>> {
    self.adj.get(node)
  }

  pub fn contains(&self, node: &T) -> bool {
    self.adj.contains_key(node)
  }

  /// All nodes, in the order they were first added
  pub fn nodes(&self) -> &[T] {
    &self.order
  }

  pub fn num_nodes(&self) -> usize {
    self.order.len()
  }

  pub fn num_edges(&self) -> usize {
    self.adj.values().map(HashSet::len).sum::<usize>() / 2
  }

  /// Idempotently add a node into the graph
  pub fn add_node(&mut self, node: T) {
    if !self.contains(&node) {
      self.adj.insert(node.clone(), HashSet::new());
      self.order.push(node);
    }
  }

  /// Add edges between a node and its neighbors
  pub fn add_graph_edges<'a, I>(&mut self, node: &T, neighbors: I)
  where
    I: IntoIterator<Item = &'a T>,
    T: 'a,
  {
    for neigh in neighbors {
      self.add_graph_edge(node.clone(), neigh.clone());
    }
  }

  /// Add an edge between two nodes, i.e. node1 and node2.
  /// Missing endpoints are created, node1 first. An edge from a node to itself
  /// is ignored.
  pub fn add_graph_edge(&mut self, node1: T, node2: T) {
    if node1 == node2 {
      return;
    }

    self.add_node(node1.clone());
    self.add_node(node2.clone());

    if let Some(neighs) = self.adj.get_mut(&node1) {
      neighs.insert(node2.clone());
    }
    if let Some(neighs) = self.adj.get_mut(&node2) {
      neighs.insert(node1);
    }
  }

  pub fn has_edge(&self, node1: &T, node2: &T) -> bool {
    self
      .adj
      .get(node1)
      .map_or(false, |neighs| neighs.contains(node2))
  }

  /// Every edge once, as (earlier node, later node) in insertion order
  pub fn edges(&self) -> Vec<(&T, &T)> {
    let position: HashMap<&T, usize> = self.order.iter().enumerate().map(|(i, n)| (n, i)).collect();
    let mut edges = vec![];
    for node in &self.order {
      for neigh in &self.adj[node] {
        if position[node] < position[neigh] {
          edges.push((node, neigh));
        }
      }
    }
    edges
  }
}

impl<T: Hash + Eq + Clone> Default for Graph<T> {
  fn default() -> Self {
    Self::new()
  }
}

/// Two graphs are equal when they have the same nodes and edges; insertion
/// order does not matter.
impl<T: Hash + Eq> PartialEq for Graph<T> {
  fn eq(&self, other: &Self) -> bool {
    self.adj == other.adj
  }
}

impl<T: Hash + Eq> Eq for Graph<T> {}
