// Local imports
use crate::graphics::aabb::AABB;
use crate::graphics::ray::{Ray, RaycastHit};
use crate::graphics::triangle::Triangle;
use crate::math::Vec3;

const NUM_BINS : usize = 8;
const LEAF_SIZE : u32 = 4;
const STACK_CAPACITY : usize = 64;

/// A flat BVH node. `left_first` is either the index of the left child (for
/// internal nodes; the right child is always `left_first+1`) or the index
/// of the first triangle in the node's leaf slice. `tri_count > 0` iff the
/// node is a leaf.
#[derive(Clone,Copy,Debug)]
struct BVHNode {
  aabb_min   : Vec3,
  left_first : u32,
  aabb_max   : Vec3,
  tri_count  : u32
}

impl BVHNode {
  fn is_leaf( &self ) -> bool {
    self.tri_count > 0
  }

  fn aabb( &self ) -> AABB {
    AABB::new( self.aabb_min, self.aabb_max )
  }

  fn cost( &self ) -> f32 {
    self.tri_count as f32 * self.aabb( ).area( )
  }
}

struct Bin {
  bounds : AABB,
  count  : u32
}

impl Bin {
  fn empty( ) -> Bin {
    Bin { bounds: AABB::EMPTY, count: 0 }
  }
}

/// A binary bounding-volume hierarchy over a fixed set of triangles, built
/// with SAH-binned partitioning (8 bins per axis). After construction the
/// triangle array is a cache-local, leaf-ordered copy of the input;
/// `reorder_map` recovers the original index of each reordered triangle,
/// which callers need to attribute materials and to ignore the
/// previously-hit triangle on secondary rays.
pub struct BVH {
  nodes        : Vec< BVHNode >,
  tri_idx      : Vec< u32 >,
  pub triangles    : Vec< Triangle >,
  pub reorder_map  : Vec< u32 >,
  orig_to_new  : Vec< u32 >,
  nodes_used   : usize
}

impl BVH {
  /// Builds a BVH over `tris`. `tris` is left untouched; the BVH owns its
  /// own leaf-ordered copy, accessible through `triangles`/`reorder_map`.
  pub fn build( tris : &[ Triangle ] ) -> BVH {
    let n = tris.len( );
    let node_capacity = if n == 0 { 1 } else { 2 * n - 1 };

    let mut bvh = BVH {
      nodes: vec![ BVHNode { aabb_min: Vec3::ZERO, left_first: 0, aabb_max: Vec3::ZERO, tri_count: 0 }; node_capacity ]
    , tri_idx: ( 0..n as u32 ).collect( )
    , triangles: Vec::new( )
    , reorder_map: Vec::new( )
    , orig_to_new: Vec::new( )
    , nodes_used: 1
    };

    if n == 0 {
      return bvh;
    }

    bvh.nodes[ 0 ].left_first = 0;
    bvh.nodes[ 0 ].tri_count = n as u32;
    bvh.update_node_bounds( 0, tris );
    bvh.subdivide( 0, tris );
    bvh.relocate_triangles( tris );

    bvh
  }

  fn update_node_bounds( &mut self, node_idx : usize, tris : &[ Triangle ] ) {
    let node = &self.nodes[ node_idx ];
    let first = node.left_first as usize;
    let count = node.tri_count as usize;

    let mut bounds = AABB::EMPTY;
    for i in 0..count {
      let tri = &tris[ self.tri_idx[ first + i ] as usize ];
      bounds = bounds.extend( tri.v[ 0 ] ).extend( tri.v[ 1 ] ).extend( tri.v[ 2 ] );
    }

    self.nodes[ node_idx ].aabb_min = bounds.min;
    self.nodes[ node_idx ].aabb_max = bounds.max;
  }

  /// Evaluates the SAH cost of every candidate split plane via 8-bin
  /// binning along each axis, and returns the best `(axis, splitPos, cost)`.
  fn find_best_split_plane( &self, node_idx : usize, tris : &[ Triangle ] ) -> ( usize, f32, f32 ) {
    let node = &self.nodes[ node_idx ];
    let first = node.left_first as usize;
    let count = node.tri_count as usize;

    let mut best_cost = std::f32::MAX;
    let mut best_axis = 0usize;
    let mut best_pos = 0.0f32;

    for axis in 0..3 {
      let mut bounds_min = std::f32::MAX;
      let mut bounds_max = -std::f32::MAX;

      for i in 0..count {
        let c = tris[ self.tri_idx[ first + i ] as usize ].centroid.axis( axis );
        bounds_min = bounds_min.min( c );
        bounds_max = bounds_max.max( c );
      }

      if bounds_min == bounds_max {
        continue;
      }

      let mut bins : [ Bin; NUM_BINS ] = [ Bin::empty( ), Bin::empty( ), Bin::empty( ), Bin::empty( )
                                         , Bin::empty( ), Bin::empty( ), Bin::empty( ), Bin::empty( ) ];
      let scale = NUM_BINS as f32 / ( bounds_max - bounds_min );

      for i in 0..count {
        let tri = &tris[ self.tri_idx[ first + i ] as usize ];
        let bin_idx = ( ( ( tri.centroid.axis( axis ) - bounds_min ) * scale ) as usize ).min( NUM_BINS - 1 );
        bins[ bin_idx ].count += 1;
        bins[ bin_idx ].bounds = bins[ bin_idx ].bounds.extend( tri.v[ 0 ] ).extend( tri.v[ 1 ] ).extend( tri.v[ 2 ] );
      }

      let mut left_area  = [ 0.0f32; NUM_BINS - 1 ];
      let mut right_area = [ 0.0f32; NUM_BINS - 1 ];
      let mut left_count  = [ 0i32; NUM_BINS - 1 ];
      let mut right_count = [ 0i32; NUM_BINS - 1 ];

      let mut left_box = AABB::EMPTY;
      let mut right_box = AABB::EMPTY;
      let mut left_sum = 0i32;
      let mut right_sum = 0i32;

      for i in 0..( NUM_BINS - 1 ) {
        left_sum += bins[ i ].count as i32;
        left_count[ i ] = left_sum;
        left_box = left_box.join( &bins[ i ].bounds );
        left_area[ i ] = left_box.area( );

        right_sum += bins[ NUM_BINS - 1 - i ].count as i32;
        right_count[ NUM_BINS - 2 - i ] = right_sum;
        right_box = right_box.join( &bins[ NUM_BINS - 1 - i ].bounds );
        right_area[ NUM_BINS - 2 - i ] = right_box.area( );
      }

      let split_scale = ( bounds_max - bounds_min ) / NUM_BINS as f32;
      for i in 0..( NUM_BINS - 1 ) {
        let plane_cost = left_count[ i ] as f32 * left_area[ i ] + right_count[ i ] as f32 * right_area[ i ];
        if plane_cost < best_cost {
          best_axis = axis;
          best_pos = bounds_min + split_scale * ( i + 1 ) as f32;
          best_cost = plane_cost;
        }
      }
    }

    ( best_axis, best_pos, best_cost )
  }

  /// Recursively splits a node in place, using an in-place two-pointer
  /// partition of `tri_idx` around the chosen split plane. Bails out to a
  /// leaf when the node is already small, or when splitting wouldn't
  /// improve on the node's own SAH cost, or when the partition is
  /// degenerate (every triangle landed on the same side).
  fn subdivide( &mut self, node_idx : usize, tris : &[ Triangle ] ) {
    let tri_count = self.nodes[ node_idx ].tri_count;
    if tri_count <= LEAF_SIZE {
      return;
    }

    let ( axis, split_pos, split_cost ) = self.find_best_split_plane( node_idx, tris );
    let no_split_cost = self.nodes[ node_idx ].cost( );
    if split_cost >= no_split_cost {
      return;
    }

    let first = self.nodes[ node_idx ].left_first as i64;
    let count = self.nodes[ node_idx ].tri_count as i64;

    let mut i = first;
    let mut j = first + count - 1;
    while i <= j {
      if tris[ self.tri_idx[ i as usize ] as usize ].centroid.axis( axis ) < split_pos {
        i += 1;
      } else {
        self.tri_idx.swap( i as usize, j as usize );
        j -= 1;
      }
    }

    let left_count = ( i - first ) as u32;
    if left_count == 0 || left_count == tri_count {
      return;
    }

    let left_idx = self.nodes_used;
    let right_idx = self.nodes_used + 1;
    self.nodes_used += 2;

    self.nodes[ left_idx ].left_first = first as u32;
    self.nodes[ left_idx ].tri_count = left_count;
    self.nodes[ right_idx ].left_first = i as u32;
    self.nodes[ right_idx ].tri_count = tri_count - left_count;

    self.nodes[ node_idx ].left_first = left_idx as u32;
    self.nodes[ node_idx ].tri_count = 0;

    self.update_node_bounds( left_idx, tris );
    self.update_node_bounds( right_idx, tris );

    self.subdivide( left_idx, tris );
    self.subdivide( right_idx, tris );
  }

  /// Copies triangles into leaf order for cache locality. Within each leaf,
  /// triangles are sorted by descending square area first, so the largest
  /// (most likely to be hit) triangles are tested first during the linear
  /// leaf scan.
  fn relocate_triangles( &mut self, tris : &[ Triangle ] ) {
    self.triangles.reserve( tris.len( ) );
    self.reorder_map = vec![ 0u32; tris.len( ) ];
    self.orig_to_new = vec![ 0u32; tris.len( ) ];

    for node_idx in 0..self.nodes_used {
      if !self.nodes[ node_idx ].is_leaf( ) {
        continue;
      }

      let first = self.nodes[ node_idx ].left_first as usize;
      let count = self.nodes[ node_idx ].tri_count as usize;

      let mut sorted : Vec< u32 > = self.tri_idx[ first..first + count ].to_vec( );
      sorted.sort_by( | &a, &b | tris[ b as usize ].square_area( ).partial_cmp( &tris[ a as usize ].square_area( ) ).unwrap( ) );

      self.nodes[ node_idx ].left_first = self.triangles.len( ) as u32;
      for tri_id in sorted {
        self.orig_to_new[ tri_id as usize ] = self.triangles.len( ) as u32;
        self.reorder_map[ self.triangles.len( ) ] = tri_id;
        self.triangles.push( tris[ tri_id as usize ] );
      }
    }
  }

  pub fn root_aabb( &self ) -> AABB {
    self.nodes[ 0 ].aabb( )
  }

  /// Looks up the (leaf-ordered) `Triangle` for a `RaycastHit`'s original
  /// index. Shading needs the full triangle (vertex normals, tangents,
  /// UVs, material index) that `RaycastHit` itself doesn't carry.
  pub fn triangle_for_hit( &self, original_index : u32 ) -> &Triangle {
    &self.triangles[ self.orig_to_new[ original_index as usize ] as usize ]
  }

  /// Iterative stack-based traversal (stack capacity 64, matching the
  /// maximum sane tree depth for any scene this renderer can load).
  /// Descends into the nearer child first and skips pushing the farther
  /// child when its box isn't hit at all, giving front-to-back ordering
  /// without needing a full priority queue.
  pub fn intersect( &self, ray : &Ray, max_len : f32, ignore_triangle : Option< u32 > ) -> Option< RaycastHit > {
    if self.nodes_used == 0 || self.triangles.is_empty( ) {
      return None;
    }

    let mut closest = max_len;
    let mut stack = [ 0u32; STACK_CAPACITY ];
    let mut stack_ptr = 0usize;
    let mut node_idx = 0u32;

    let mut best : Option< RaycastHit > = None;

    loop {
      let node = &self.nodes[ node_idx as usize ];

      if node.is_leaf( ) {
        let first = node.left_first as usize;
        let count = node.tri_count as usize;

        for i in 0..count {
          let tri_pos = first + i;
          let original_idx = self.reorder_map[ tri_pos ];
          if Some( original_idx ) == ignore_triangle {
            continue;
          }

          if let Some( mut hit ) = self.triangles[ tri_pos ].intersect( ray.origin, ray.dir, closest ) {
            hit.triangle = original_idx;
            closest = hit.distance;
            best = Some( hit );
          }
        }

        if stack_ptr == 0 {
          break;
        }
        stack_ptr -= 1;
        node_idx = stack[ stack_ptr ];
        continue;
      }

      let mut child1 = node.left_first;
      let mut child2 = node.left_first + 1;

      let mut dist1 = self.nodes[ child1 as usize ].aabb( ).hit( ray, closest );
      let mut dist2 = self.nodes[ child2 as usize ].aabb( ).hit( ray, closest );

      if dist1 > dist2 {
        std::mem::swap( &mut dist1, &mut dist2 );
        std::mem::swap( &mut child1, &mut child2 );
      }

      if dist1 == std::f32::INFINITY {
        if stack_ptr == 0 {
          break;
        }
        stack_ptr -= 1;
        node_idx = stack[ stack_ptr ];
      } else {
        node_idx = child1;
        if dist2 != std::f32::INFINITY {
          stack[ stack_ptr ] = child2;
          stack_ptr += 1;
        }
      }
    }

    best
  }

  #[cfg(test)]
  pub fn node_count( &self ) -> usize {
    self.nodes_used
  }

  #[cfg(test)]
  pub fn leaf_aabbs_contain_their_triangles( &self ) -> bool {
    for node_idx in 0..self.nodes_used {
      let node = &self.nodes[ node_idx ];
      if !node.is_leaf( ) {
        continue;
      }
      let aabb = node.aabb( );
      let first = node.left_first as usize;
      let count = node.tri_count as usize;
      for i in 0..count {
        let tri = &self.triangles[ first + i ];
        for v in &tri.v {
          if !aabb.contains_point( v ) {
            return false;
          }
        }
      }
    }
    true
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::math::Vec2;

  fn tri_at( x : f32 ) -> Triangle {
    let v = [ Vec3::new( x, 0.0, 0.0 ), Vec3::new( x + 1.0, 0.0, 0.0 ), Vec3::new( x, 1.0, 0.0 ) ];
    let n = [ Vec3::new( 0.0, 0.0, 1.0 ); 3 ];
    let uv = [ Vec2::ZERO, Vec2::new( 1.0, 0.0 ), Vec2::new( 0.0, 1.0 ) ];
    Triangle::new( v, n, Some( uv ), 0 )
  }

  fn many_triangles( n : usize ) -> Vec< Triangle > {
    ( 0..n ).map( | i | tri_at( i as f32 * 3.0 ) ).collect( )
  }

  #[test]
  fn completeness_every_triangle_appears_once( ) {
    let tris = many_triangles( 37 );
    let bvh = BVH::build( &tris );

    let mut seen = vec![ false; tris.len( ) ];
    for &orig in &bvh.reorder_map {
      assert!( !seen[ orig as usize ], "triangle {} appeared twice", orig );
      seen[ orig as usize ] = true;
    }
    assert!( seen.iter( ).all( | &s | s ), "not every triangle was placed in a leaf" );
  }

  #[test]
  fn leaf_aabbs_contain_their_triangles( ) {
    let tris = many_triangles( 50 );
    let bvh = BVH::build( &tris );
    assert!( bvh.leaf_aabbs_contain_their_triangles( ) );
  }

  #[test]
  fn small_scene_stays_a_single_leaf( ) {
    let tris = many_triangles( 3 );
    let bvh = BVH::build( &tris );
    assert_eq!( bvh.node_count( ), 1 );
  }

  #[test]
  fn traversal_matches_brute_force( ) {
    let tris = many_triangles( 64 );
    let bvh = BVH::build( &tris );

    for i in 0..64 {
      let x = i as f32 * 3.0 + 0.25;
      let origin = Vec3::new( x, 0.25, 5.0 );
      let dir = Vec3::new( 0.0, 0.0, -1.0 );
      let ray = Ray::new( origin, dir );

      let bvh_hit = bvh.intersect( &ray, std::f32::INFINITY, None );

      let mut brute_best : Option< f32 > = None;
      for tri in &tris {
        if let Some( h ) = tri.intersect( origin, dir, std::f32::INFINITY ) {
          brute_best = Some( brute_best.map_or( h.distance, | b | b.min( h.distance ) ) );
        }
      }

      match ( bvh_hit, brute_best ) {
        ( Some( h ), Some( b ) ) => assert!( ( h.distance - b ).abs( ) < 1e-4 ),
        ( None, None ) => { }
        ( a, b ) => panic!( "mismatch at tile {}: bvh={:?} brute={:?}", i, a.map( | h | h.distance ), b )
      }
    }
  }

  #[test]
  fn ignore_triangle_skips_the_named_hit( ) {
    let tris = vec![ tri_at( 0.0 ) ];
    let bvh = BVH::build( &tris );
    let ray = Ray::new( Vec3::new( 0.25, 0.25, 1.0 ), Vec3::new( 0.0, 0.0, -1.0 ) );

    assert!( bvh.intersect( &ray, std::f32::INFINITY, None ).is_some( ) );
    assert!( bvh.intersect( &ray, std::f32::INFINITY, Some( 0 ) ).is_none( ) );
  }

  #[test]
  fn empty_scene_has_no_hit( ) {
    let tris : Vec< Triangle > = Vec::new( );
    let bvh = BVH::build( &tris );
    let ray = Ray::new( Vec3::ZERO, Vec3::new( 0.0, 0.0, -1.0 ) );
    assert!( bvh.intersect( &ray, std::f32::INFINITY, None ).is_none( ) );
  }
}
